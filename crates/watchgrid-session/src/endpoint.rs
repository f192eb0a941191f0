//! Configuration endpoint collaborator.
//!
//! [`ConfigEndpoint`] abstracts the REST resource that stores watchers plus
//! the read-only catalog (supervisor types, per-component attributes) and
//! the operational-range recommender. [`FileEndpoint`] implements it over
//! JSON files so the console can run without a server.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

/// Remote store of watcher configuration.
pub trait ConfigEndpoint {
    /// `GET` every watcher as one object keyed by watcher name.
    fn fetch_watchers(&self) -> impl Future<Output = anyhow::Result<Value>> + Send;

    /// `PUT` a single watcher body under `name`.
    fn put_watcher(&self, name: &str, body: Value)
    -> impl Future<Output = anyhow::Result<()>> + Send;

    /// `DELETE` the watcher stored under `name`.
    fn delete_watcher(&self, name: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Supervisor implementation tags a watcher's `type` may take.
    fn supervisor_types(&self) -> impl Future<Output = anyhow::Result<Vec<String>>> + Send;

    /// Attribute names available per monitored component.
    fn component_attributes(
        &self,
    ) -> impl Future<Output = anyhow::Result<BTreeMap<String, Vec<String>>>> + Send;

    /// Suggested operational range for a watcher's policy, in bracket notation.
    fn recommend_range(
        &self,
        watcher: &str,
        policy: &str,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// [`ConfigEndpoint`] backed by a JSON document on disk.
///
/// The document has the same name-keyed shape the REST endpoint serves; a
/// missing file reads as empty. The optional catalog file holds
/// `{"types": [...], "attributes": {...}, "recommendations": {"watcher/policy": "[0‥80)"}}`.
pub struct FileEndpoint {
    path: PathBuf,
    catalog: Option<PathBuf>,
    /// Serializes read-modify-write cycles on the document.
    write_lock: Mutex<()>,
}

impl FileEndpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            catalog: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_catalog(mut self, catalog: impl Into<PathBuf>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> anyhow::Result<Map<String, Value>> {
        match read_json(&self.path).await? {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(_) => bail!("{} does not hold a JSON object", self.path.display()),
        }
    }

    async fn write_document(&self, document: Map<String, Value>) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(&Value::Object(document))?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, text)
            .await
            .with_context(|| format!("writing {}", staging.display()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    async fn catalog_entry(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let Some(catalog) = &self.catalog else {
            return Ok(None);
        };
        Ok(read_json(catalog).await?.and_then(|mut c| c.get_mut(key).map(Value::take)))
    }
}

async fn read_json(path: &Path) -> anyhow::Result<Option<Value>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

impl ConfigEndpoint for FileEndpoint {
    async fn fetch_watchers(&self) -> anyhow::Result<Value> {
        Ok(Value::Object(self.read_document().await?))
    }

    async fn put_watcher(&self, name: &str, body: Value) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(name.to_string(), body);
        self.write_document(document).await?;
        debug!(watcher = %name, path = %self.path.display(), "watcher written");
        Ok(())
    }

    async fn delete_watcher(&self, name: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        if document.remove(name).is_none() {
            bail!("watcher {name} does not exist");
        }
        self.write_document(document).await?;
        debug!(watcher = %name, path = %self.path.display(), "watcher removed");
        Ok(())
    }

    async fn supervisor_types(&self) -> anyhow::Result<Vec<String>> {
        match self.catalog_entry("types").await? {
            Some(types) => Ok(serde_json::from_value(types)?),
            None => Ok(Vec::new()),
        }
    }

    async fn component_attributes(&self) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
        match self.catalog_entry("attributes").await? {
            Some(attributes) => Ok(serde_json::from_value(attributes)?),
            None => Ok(BTreeMap::new()),
        }
    }

    async fn recommend_range(&self, watcher: &str, policy: &str) -> anyhow::Result<String> {
        let key = format!("{watcher}/{policy}");
        self.catalog_entry("recommendations")
            .await?
            .and_then(|mut r| r.get_mut(&key).map(Value::take))
            .and_then(|r| r.as_str().map(str::to_string))
            .ok_or_else(|| anyhow!("no recommendation for {key}"))
    }
}
