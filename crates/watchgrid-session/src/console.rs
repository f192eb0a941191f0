//! Watcher console — saved working set plus the in-progress draft.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use watchgrid_model::{OpRange, ScalingPolicy, Watcher, parse_watchers};

use crate::endpoint::ConfigEndpoint;
use crate::error::{SessionError, SessionResult};

/// Where the current draft came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOrigin {
    /// Created with "add new".
    New,
    /// Deep copy of the saved watcher with this name.
    Existing(String),
}

/// Edit state of the console.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Unselected,
    Editing { draft: Watcher, origin: EditOrigin },
}

/// Saved watchers and at most one draft.
///
/// The saved set only changes after the endpoint acknowledges a write, and
/// refreshing it never touches the draft.
#[derive(Debug, Default)]
pub struct WatcherConsole {
    saved: BTreeMap<String, Watcher>,
    state: SessionState,
}

impl WatcherConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the saved set from the endpoint.
    pub async fn load<E: ConfigEndpoint>(endpoint: &E) -> SessionResult<Self> {
        let mut console = Self::new();
        console.refresh(endpoint).await?;
        Ok(console)
    }

    pub fn saved(&self) -> &BTreeMap<String, Watcher> {
        &self.saved
    }

    pub fn watcher(&self, name: &str) -> Option<&Watcher> {
        self.saved.get(name)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, SessionState::Editing { .. })
    }

    pub fn draft(&self) -> Option<&Watcher> {
        match &self.state {
            SessionState::Editing { draft, .. } => Some(draft),
            SessionState::Unselected => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut Watcher> {
        match &mut self.state {
            SessionState::Editing { draft, .. } => Some(draft),
            SessionState::Unselected => None,
        }
    }

    fn ensure_unselected(&self) -> SessionResult<()> {
        match self.draft() {
            Some(draft) => Err(SessionError::SessionInProgress(draft.name().to_string())),
            None => Ok(()),
        }
    }

    /// Start editing a brand-new watcher with empty collections.
    pub fn begin_new(&mut self, name: &str) -> SessionResult<&mut Watcher> {
        self.ensure_unselected()?;
        debug!(watcher = %name, "editing new watcher");
        self.state = SessionState::Editing {
            draft: Watcher::new(name),
            origin: EditOrigin::New,
        };
        self.draft_mut().ok_or(SessionError::NoActiveSession)
    }

    /// Start editing a deep copy of a saved watcher.
    pub fn begin_edit(&mut self, name: &str) -> SessionResult<&mut Watcher> {
        self.ensure_unselected()?;
        let draft = self
            .saved
            .get(name)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;
        debug!(watcher = %name, "editing saved watcher");
        self.state = SessionState::Editing {
            draft,
            origin: EditOrigin::Existing(name.to_string()),
        };
        self.draft_mut().ok_or(SessionError::NoActiveSession)
    }

    /// Discard the draft. Purely local.
    pub fn cancel(&mut self) -> Option<Watcher> {
        match std::mem::take(&mut self.state) {
            SessionState::Editing { draft, .. } => {
                debug!(watcher = %draft.name(), "edit cancelled");
                Some(draft)
            }
            SessionState::Unselected => None,
        }
    }

    /// Validate and persist the draft.
    ///
    /// On success the draft replaces (or joins) the saved watcher of the same
    /// name and the console returns to `Unselected`. On failure the saved set
    /// is unchanged and the draft stays open.
    pub async fn save<E: ConfigEndpoint>(&mut self, endpoint: &E) -> SessionResult<String> {
        let SessionState::Editing { draft, .. } = &mut self.state else {
            return Err(SessionError::NoActiveSession);
        };
        draft.validate()?;
        let name = draft.name().to_string();
        let body = draft.to_json()?;

        if let Err(e) = endpoint.put_watcher(&name, body).await {
            warn!(watcher = %name, error = %e, "saving watcher failed");
            return Err(SessionError::Endpoint(e));
        }

        if let SessionState::Editing { draft, origin } = std::mem::take(&mut self.state) {
            let replaced = self.saved.insert(name.clone(), draft).is_some();
            info!(watcher = %name, ?origin, replaced, "watcher saved");
        }
        Ok(name)
    }

    /// Delete a saved watcher once the endpoint acknowledges.
    ///
    /// A draft of the same watcher is discarded with it.
    pub async fn delete<E: ConfigEndpoint>(&mut self, name: &str, endpoint: &E) -> SessionResult<()> {
        if !self.saved.contains_key(name) {
            return Err(SessionError::NotFound(name.to_string()));
        }
        endpoint.delete_watcher(name).await?;
        self.saved.remove(name);

        if let SessionState::Editing {
            origin: EditOrigin::Existing(editing),
            ..
        } = &self.state
            && editing == name
        {
            self.state = SessionState::Unselected;
        }
        info!(watcher = %name, "watcher deleted");
        Ok(())
    }

    /// Re-fetch the saved set (the periodic poll). The draft is left alone.
    pub async fn refresh<E: ConfigEndpoint>(&mut self, endpoint: &E) -> SessionResult<usize> {
        let document = endpoint.fetch_watchers().await?;
        self.saved = parse_watchers(&document)?;
        debug!(
            watchers = self.saved.len(),
            editing = self.is_editing(),
            "saved watchers refreshed"
        );
        Ok(self.saved.len())
    }

    /// Ask the recommender for a metric policy's operational range and apply
    /// it to the draft.
    pub async fn recommend_range<E: ConfigEndpoint>(
        &mut self,
        endpoint: &E,
        policy_name: &str,
    ) -> SessionResult<OpRange> {
        let draft = self.draft().ok_or(SessionError::NoActiveSession)?;
        let scriptlet = draft
            .scaling_policies
            .get(policy_name)
            .ok_or_else(|| SessionError::NotFound(policy_name.to_string()))?;
        if !matches!(scriptlet.policy_object, Some(ScalingPolicy::AttributeBased(_))) {
            return Err(SessionError::NotMetricPolicy(policy_name.to_string()));
        }

        let text = endpoint.recommend_range(draft.name(), policy_name).await?;
        let range = OpRange::parse(&text)?;

        if let Some(Some(ScalingPolicy::AttributeBased(policy))) = self
            .draft_mut()
            .and_then(|d| d.scaling_policies.get_mut(policy_name))
            .map(|s| s.policy_object.as_mut())
        {
            policy.operational_range = range;
        }
        debug!(policy = %policy_name, %range, "recommended range applied");
        Ok(range)
    }

    /// Supervisor types offered by the endpoint's catalog.
    pub async fn supervisor_types<E: ConfigEndpoint>(endpoint: &E) -> SessionResult<Vec<String>> {
        Ok(endpoint.supervisor_types().await?)
    }

    /// Attribute names per component offered by the endpoint's catalog.
    pub async fn component_attributes<E: ConfigEndpoint>(
        endpoint: &E,
    ) -> SessionResult<BTreeMap<String, Vec<String>>> {
        Ok(endpoint.component_attributes().await?)
    }
}
