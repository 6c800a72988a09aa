//! Bridge configuration
//!
//! Settings come from three layers, later ones winning:
//! built-in defaults, an optional TOML/YAML/JSON file, then environment
//! variables prefixed with `PATTERN_BRIDGE_`.

use crate::error::{BridgeError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_URL: &str = "PATTERN_BRIDGE_URL";
pub const ENV_TIMEOUT_MS: &str = "PATTERN_BRIDGE_TIMEOUT_MS";
pub const ENV_HEALTH_TIMEOUT_MS: &str = "PATTERN_BRIDGE_HEALTH_TIMEOUT_MS";
pub const ENV_STARTUP_ATTEMPTS: &str = "PATTERN_BRIDGE_STARTUP_ATTEMPTS";

/// Request body layout sent to `/execute`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `{requestID, patternID, text, parameters, context?}`
    #[default]
    Correlated,
    /// `{pattern_id, text, parameters}` for workers that predate request ids
    Legacy,
}

/// Configuration for the worker bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Worker base URL
    pub base_url: String,

    /// Deadline for `/execute` and `/version` calls, in milliseconds
    pub timeout_ms: u64,

    /// Deadline for `/health` probes, in milliseconds
    pub health_timeout_ms: u64,

    /// Health probes made by `start()`; 0 skips probing
    pub startup_attempts: u32,

    /// Pause between startup probes, in milliseconds
    pub startup_interval_ms: u64,

    /// Request body layout
    pub wire_format: WireFormat,

    /// Optional User-Agent header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_health_timeout_ms() -> u64 {
    5_000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            health_timeout_ms: default_health_timeout_ms(),
            startup_attempts: 1,
            startup_interval_ms: 500,
            wire_format: WireFormat::default(),
            user_agent: None,
        }
    }
}

impl BridgeConfig {
    /// Create a config pointing at `base_url` with default timeouts
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Overlay `PATTERN_BRIDGE_*` environment variables onto this config
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_URL) {
            self.base_url = url;
        }
        if let Some(ms) = parse_var(&lookup, ENV_TIMEOUT_MS)? {
            self.timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, ENV_HEALTH_TIMEOUT_MS)? {
            self.health_timeout_ms = ms;
        }
        if let Some(attempts) = parse_var(&lookup, ENV_STARTUP_ATTEMPTS)? {
            self.startup_attempts = attempts;
        }
        Ok(self)
    }

    /// Set the `/execute` and `/version` deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the `/health` probe deadline
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set how many health probes `start()` makes before giving up
    ///
    /// # Arguments
    /// * `attempts` - Probe count; 0 skips probing and starts immediately
    pub fn with_startup_attempts(mut self, attempts: u32) -> Self {
        self.startup_attempts = attempts;
        self
    }

    /// Set the pause between startup probes
    pub fn with_startup_interval(mut self, interval: Duration) -> Self {
        self.startup_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Choose the request body layout
    pub fn with_wire_format(mut self, format: WireFormat) -> Self {
        self.wire_format = format;
        self
    }

    /// Send a custom User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Request deadline as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Health probe deadline as a `Duration`
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    /// Pause between startup probes as a `Duration`
    pub fn startup_interval(&self) -> Duration {
        Duration::from_millis(self.startup_interval_ms)
    }

    /// Reject configurations the bridge cannot work with
    ///
    /// # Returns
    /// * `Ok(())` if the config is usable
    /// * `Err(BridgeError::Config)` for an empty or non-http base URL or a
    ///   zero timeout
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(BridgeError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(BridgeError::Config("timeout_ms must be greater than 0".to_string()));
        }
        if self.health_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "health_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            BridgeError::Config(format!("Failed to parse environment variable {}: {}", key, e))
        }),
        None => Ok(None),
    }
}

/// Load a configuration file, choosing the format from its extension
///
/// Supports `.toml`, `.yaml`/`.yml` and `.json`.
pub fn load_config_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| {
            BridgeError::Config(format!("Unable to determine file extension for {:?}", path))
        })?;

    let content = std::fs::read_to_string(path)
        .map_err(|e| BridgeError::Config(format!("Failed to read {:?}: {}", path, e)))?;

    let parse_error = |format: &str, e: &dyn std::fmt::Display| {
        BridgeError::Config(format!("Failed to parse {} config from {:?}: {}", format, path, e))
    };

    match extension.to_lowercase().as_str() {
        "toml" => toml::from_str(&content).map_err(|e| parse_error("TOML", &e)),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| parse_error("YAML", &e)),
        "json" => serde_json::from_str(&content).map_err(|e| parse_error("JSON", &e)),
        other => Err(BridgeError::Config(format!(
            "Unsupported config file extension: {}",
            other
        ))),
    }
}
