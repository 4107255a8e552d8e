//! Engine configuration file.
//!
//! A small TOML file; every key is optional:
//!
//! ```toml
//! keep_unknown = false      # keep source text of unknown names
//! notify_listeners = true   # notify registry listeners while iterating
//! modules = ["system.core", "system.string"]   # empty = all system modules
//! dump_width = 80           # width of the --list function listing
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;

use crate::script::builtins::{SystemProvider, MODULE_IDS};
use crate::script::{Registry, Script};

/// A configuration file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown module '{0}'")]
    UnknownModule(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub keep_unknown: bool,
    pub notify_listeners: bool,
    pub modules: Vec<String>,
    pub dump_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            keep_unknown: false,
            notify_listeners: true,
            modules: Vec::new(),
            dump_width: 80,
        }
    }
}

impl EngineConfig {
    pub fn load_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        if let Some(unknown) = config.modules.iter().find(|m| !MODULE_IDS.contains(&m.as_str())) {
            return Err(ConfigError::UnknownModule(unknown.clone()));
        }
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::load_str(&s)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_file(path)
        } else {
            warn!("config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// A registry holding the configured system modules.
    pub fn build_registry(&self) -> Registry {
        let provider = if self.modules.is_empty() {
            SystemProvider::new()
        } else {
            SystemProvider::only(self.modules.iter().cloned())
        };
        let mut registry = Registry::new();
        registry.bootstrap(&[&provider], Vec::new());
        registry
    }

    /// A script over `registry` with this configuration's flags.
    pub fn script(&self, registry: Arc<Registry>) -> Script {
        Script::new(registry)
            .with_keep_unknown(self.keep_unknown)
            .with_notify(self.notify_listeners)
    }
}
