//! CLI configuration
//!
//! ```toml
//! [bridge]
//! base_url = "http://127.0.0.1:8765"
//! timeout_ms = 30000
//!
//! [[remote_patterns]]
//! id = "translate"
//! name = "Translate"
//! description = "Machine translation on the worker"
//! ```

use anyhow::{Context, Result};
use pattern_bridge::{load_config_file, BridgeConfig};
use pattern_core::{PatternDescriptor, PatternKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A pattern served by the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePatternConfig {
    pub id: String,

    /// Defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl RemotePatternConfig {
    pub fn descriptor(&self) -> PatternDescriptor {
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        let descriptor = PatternDescriptor::new(&self.id, name, PatternKind::RemoteWorker)
            .with_description(&self.description);
        match &self.version {
            Some(version) => descriptor.with_version(version),
            None => descriptor,
        }
    }
}

/// Top-level CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bridge: BridgeConfig,
    pub remote_patterns: Vec<RemotePatternConfig>,
}

impl AppConfig {
    /// Load from `path` (or defaults when absent), then apply environment
    /// overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env()
    }

    /// Load from a `.toml`, `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = load_config_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        config.bridge.validate()?;
        Ok(config)
    }

    pub fn with_env(mut self) -> Result<Self> {
        self.bridge = self.bridge.apply_env()?;
        self.bridge.validate()?;
        Ok(self)
    }

    pub fn has_remote_patterns(&self) -> bool {
        !self.remote_patterns.is_empty()
    }
}
