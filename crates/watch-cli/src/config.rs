//! watchctl.toml configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "watchctl.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// JSON document holding every watcher, keyed by name.
    pub store: PathBuf,
    /// Optional catalog of supervisor types, attributes and range recommendations.
    pub catalog: Option<PathBuf>,
    /// Voting strategy given to watchers created with `new`.
    pub default_strategy: String,
    /// Default tracing directive, extended by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            store: PathBuf::from("watchers.json"),
            catalog: None,
            default_strategy: "all".to_string(),
            log_filter: "watchctl=info".to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConsoleConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load an explicit config file, or `watchctl.toml` if present, or defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
