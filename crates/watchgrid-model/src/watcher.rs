//! Watcher — the autoscaling supervisor aggregate.
//!
//! Owns attribute checkers keyed by attribute name, a trigger, scaling
//! policies keyed by policy name, cluster sizing and the voting strategy
//! that combines policy votes. The voting strategy travels inside the
//! parameter map under the reserved `$strategy$` key.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::duration::{format_iso8601, millis_from_f64, parse_iso8601};
use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::scriptlet::{Language, Scriptlet};

/// Reserved parameter key carrying the voting strategy.
pub const STRATEGY_KEY: &str = "$strategy$";

/// Returned by [`Watcher::checker_type_for_attribute_name`] for unknown attributes.
pub const NOT_AVAILABLE: &str = "n/a";

/// How policy votes are combined into one scaling decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VotingStrategy {
    #[default]
    All,
    Any,
    Most,
    /// Weights are edited by hand.
    Custom,
}

impl VotingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            VotingStrategy::All => "all",
            VotingStrategy::Any => "any",
            VotingStrategy::Most => "most",
            VotingStrategy::Custom => "custom",
        }
    }
}

impl fmt::Display for VotingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for VotingStrategy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(VotingStrategy::All),
            "any" => Ok(VotingStrategy::Any),
            "most" => Ok(VotingStrategy::Most),
            "custom" => Ok(VotingStrategy::Custom),
            other => Err(ModelError::Invalid(format!("unknown voting strategy: {other}"))),
        }
    }
}

/// An autoscaling supervisor bundle attached to a resource group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Watcher {
    pub entity: Entity,
    pub attribute_checkers: BTreeMap<String, Scriptlet>,
    pub trigger: Scriptlet,
    pub scaling_policies: BTreeMap<String, Scriptlet>,
    pub connection_string_template: String,
    pub scaling_size: u32,
    pub min_cluster_size: u32,
    pub max_cluster_size: u32,
    /// Milliseconds between scaling actions.
    pub cooldown_time: u64,
    /// Supervisor implementation tag.
    pub kind: String,
    pub auto_scaling: bool,
    pub voting_strategy: VotingStrategy,
}

impl Watcher {
    /// Fresh watcher with empty checker and policy collections.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            entity: Entity::new(name),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }

    /// Build a watcher from the configuration endpoint's JSON.
    ///
    /// Checker and policy entries without a `language` are skipped.
    pub fn from_json(name: &str, json: &Value) -> ModelResult<Self> {
        let mut watcher = Watcher::new(name);

        let mut parameters = json.get("parameters").cloned().unwrap_or(Value::Null);
        if let Value::Object(map) = &mut parameters
            && let Some(strategy) = map.remove(STRATEGY_KEY)
            && let Some(strategy) = strategy.as_str().filter(|s| !s.is_empty())
        {
            watcher.voting_strategy = strategy.parse()?;
        }
        watcher.entity.load_parameters(Some(&parameters));

        watcher.attribute_checkers = scriptlet_map(json.get("attributeCheckers"))?;
        watcher.scaling_policies = scriptlet_map(json.get("scalingPolicies"))?;

        if let Some(trigger) = json.get("trigger").filter(|t| t.is_object()) {
            watcher.trigger = Scriptlet::from_json(trigger)?;
        }
        if let Some(template) = json.get("connectionStringTemplate").and_then(Value::as_str) {
            watcher.connection_string_template = template.to_string();
        }
        if let Some(size) = u32_field(json, "scalingSize")? {
            watcher.scaling_size = size;
        }
        if let Some(size) = u32_field(json, "minClusterSize")? {
            watcher.min_cluster_size = size;
        }
        if let Some(size) = u32_field(json, "maxClusterSize")? {
            watcher.max_cluster_size = size;
        }
        match json.get("cooldownTime") {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => watcher.cooldown_time = parse_iso8601(text)?,
            Some(Value::Number(n)) => {
                watcher.cooldown_time = n
                    .as_u64()
                    .or_else(|| n.as_f64().and_then(millis_from_f64))
                    .ok_or_else(|| ModelError::InvalidDuration(n.to_string()))?;
            }
            Some(other) => return Err(ModelError::InvalidDuration(other.to_string())),
        }
        if let Some(kind) = json.get("type").and_then(Value::as_str) {
            watcher.kind = kind.to_string();
        }
        if let Some(auto_scaling) = json.get("autoScaling").and_then(Value::as_bool) {
            watcher.auto_scaling = auto_scaling;
        }
        if watcher.auto_scaling && watcher.min_cluster_size > watcher.max_cluster_size {
            warn!(
                watcher = %name,
                min = watcher.min_cluster_size,
                max = watcher.max_cluster_size,
                "minClusterSize exceeds maxClusterSize"
            );
        }

        debug!(
            watcher = %name,
            checkers = watcher.checkers_count(),
            policies = watcher.policies_count(),
            strategy = %watcher.voting_strategy,
            "watcher decoded"
        );
        Ok(watcher)
    }

    /// Encode for the configuration endpoint.
    ///
    /// Every structured scriptlet re-encodes its payload into `script` as a
    /// side effect. Sizing fields are only emitted while auto-scaling.
    pub fn to_json(&mut self) -> ModelResult<Value> {
        let mut object = Map::new();

        let mut parameters = self.entity.parameters_json();
        parameters.insert(
            STRATEGY_KEY.to_string(),
            Value::from(self.voting_strategy.as_str()),
        );
        object.insert("parameters".to_string(), Value::Object(parameters));

        let mut checkers = Map::new();
        for (attribute, checker) in &mut self.attribute_checkers {
            checkers.insert(attribute.clone(), checker.to_json()?);
        }
        object.insert("attributeCheckers".to_string(), Value::Object(checkers));

        let mut policies = Map::new();
        for (name, policy) in &mut self.scaling_policies {
            policies.insert(name.clone(), policy.to_json()?);
        }
        object.insert("scalingPolicies".to_string(), Value::Object(policies));

        object.insert("trigger".to_string(), self.trigger.to_json()?);
        object.insert(
            "connectionStringTemplate".to_string(),
            Value::from(self.connection_string_template.clone()),
        );
        object.insert("type".to_string(), Value::from(self.kind.clone()));
        object.insert("autoScaling".to_string(), Value::from(self.auto_scaling));

        if self.auto_scaling {
            object.insert(
                "cooldownTime".to_string(),
                Value::from(format_iso8601(self.cooldown_time)),
            );
            object.insert("scalingSize".to_string(), Value::from(self.scaling_size));
            object.insert("minClusterSize".to_string(), Value::from(self.min_cluster_size));
            object.insert("maxClusterSize".to_string(), Value::from(self.max_cluster_size));
        }

        Ok(Value::Object(object))
    }

    /// Check the invariants a watcher must hold before it is saved.
    pub fn validate(&self) -> ModelResult<()> {
        if self.entity.name.trim().is_empty() {
            return Err(ModelError::Invalid("watcher name is empty".to_string()));
        }
        if self.auto_scaling && self.min_cluster_size > self.max_cluster_size {
            return Err(ModelError::Invalid(format!(
                "minClusterSize {} exceeds maxClusterSize {}",
                self.min_cluster_size, self.max_cluster_size
            )));
        }
        self.trigger.validate()?;
        for checker in self.attribute_checkers.values() {
            checker.validate()?;
        }
        for policy in self.scaling_policies.values() {
            policy.validate()?;
        }
        Ok(())
    }

    /// Reassign vote weights on every structured policy per the voting strategy.
    ///
    /// `all` gives each policy just over one half, `any` just over half the
    /// policy count, `most` exactly one. `custom` leaves weights alone, as do
    /// Groovy policies and policies without a payload.
    pub fn recalculate_votes(&mut self) {
        let weight = match self.voting_strategy {
            VotingStrategy::All => 0.5 + f64::EPSILON,
            VotingStrategy::Any => self.policies_count() as f64 / 2.0 + f64::EPSILON,
            VotingStrategy::Most => 1.0,
            VotingStrategy::Custom => return,
        };

        let mut updated = 0;
        for scriptlet in self.scaling_policies.values_mut() {
            if scriptlet.language == Language::Groovy {
                continue;
            }
            if let Some(policy) = scriptlet.policy_object.as_mut() {
                policy.weight_mut().vote_weight = weight;
                updated += 1;
            }
        }
        debug!(
            watcher = %self.entity.name,
            strategy = %self.voting_strategy,
            weight,
            updated,
            "vote weights recalculated"
        );
    }

    /// Change the voting strategy and recompute weights to match.
    pub fn set_voting_strategy(&mut self, strategy: VotingStrategy) {
        self.voting_strategy = strategy;
        self.recalculate_votes();
    }

    pub fn checker_exists(&self, attribute_name: &str) -> bool {
        self.attribute_checkers.contains_key(attribute_name)
    }

    /// Language of the checker for `attribute_name`, or `n/a`.
    pub fn checker_type_for_attribute_name(&self, attribute_name: &str) -> &'static str {
        self.attribute_checkers
            .get(attribute_name)
            .map_or(NOT_AVAILABLE, |c| c.language.as_str())
    }

    pub fn checkers_count(&self) -> usize {
        self.attribute_checkers.len()
    }

    pub fn policies_count(&self) -> usize {
        self.scaling_policies.len()
    }

    /// Add or replace the checker for an attribute.
    pub fn put_checker(&mut self, attribute_name: impl Into<String>, checker: Scriptlet) {
        self.attribute_checkers.insert(attribute_name.into(), checker);
    }

    pub fn remove_checker(&mut self, attribute_name: &str) -> Option<Scriptlet> {
        self.attribute_checkers.remove(attribute_name)
    }

    /// Add or replace a scaling policy.
    pub fn put_policy(&mut self, name: impl Into<String>, policy: Scriptlet) {
        self.scaling_policies.insert(name.into(), policy);
    }

    pub fn remove_policy(&mut self, name: &str) -> Option<Scriptlet> {
        self.scaling_policies.remove(name)
    }
}

/// Decode every watcher of a name-keyed configuration document.
pub fn parse_watchers(json: &Value) -> ModelResult<BTreeMap<String, Watcher>> {
    let Value::Object(map) = json else {
        return Err(ModelError::Invalid(
            "watcher configuration is not a JSON object".to_string(),
        ));
    };
    map.iter()
        .map(|(name, body)| -> ModelResult<(String, Watcher)> {
            Ok((name.clone(), Watcher::from_json(name, body)?))
        })
        .collect()
}

fn scriptlet_map(json: Option<&Value>) -> ModelResult<BTreeMap<String, Scriptlet>> {
    let mut scriptlets = BTreeMap::new();
    let Some(Value::Object(entries)) = json else {
        return Ok(scriptlets);
    };
    for (name, entry) in entries {
        let has_language = entry
            .get("language")
            .and_then(Value::as_str)
            .is_some_and(|l| !l.is_empty());
        if !has_language {
            warn!(entry = %name, "skipping scriptlet without language");
            continue;
        }
        scriptlets.insert(name.clone(), Scriptlet::from_json(entry)?);
    }
    Ok(scriptlets)
}

/// A present sizing field must be a whole number that fits in `u32`.
fn u32_field(json: &Value, key: &str) -> ModelResult<Option<u32>> {
    match json.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| ModelError::Invalid(format!("{key} must be a cluster size, got {value}"))),
    }
}
