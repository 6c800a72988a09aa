use crate::config::AppConfig;
use anyhow::{Context, Result};
use pattern_bridge::{register_remote_patterns, IpcBridge};
use pattern_core::builtin::register_builtin_patterns;
use pattern_core::{DynamicMap, PatternInput, PatternRegistry};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Registry plus the optional worker bridge behind it
pub struct App {
    pub registry: PatternRegistry,
    pub bridge: Option<IpcBridge>,
}

impl App {
    /// Install built-in patterns and, when remote patterns are configured,
    /// start the bridge and register them.
    ///
    /// An unreachable worker is logged, not fatal: remote patterns then
    /// report "backend not running" failures while local ones keep working.
    pub async fn bootstrap(config: &AppConfig) -> Result<Self> {
        let registry = PatternRegistry::new();
        register_builtin_patterns(&registry).context("Failed to register built-in patterns")?;

        let bridge = if config.has_remote_patterns() {
            let bridge = IpcBridge::new(config.bridge.clone())?;
            if let Err(e) = bridge.start().await {
                warn!(error = %e, "Worker unavailable, remote patterns will fail");
            }

            let count = register_remote_patterns(
                &registry,
                &bridge,
                config.remote_patterns.iter().map(|p| p.descriptor()),
            )
            .context("Failed to register remote patterns")?;
            info!(count, base_url = %config.bridge.base_url, "Registered remote patterns");

            Some(bridge)
        } else {
            None
        };

        Ok(Self { registry, bridge })
    }

    pub async fn shutdown(&self) {
        if let Some(bridge) = &self.bridge {
            bridge.stop().await;
        }
    }
}

/// One entry of a batch file
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    #[serde(alias = "patternID")]
    pub pattern_id: String,
    pub text: String,
    #[serde(default)]
    pub parameters: DynamicMap,
    #[serde(default)]
    pub context: Option<DynamicMap>,
}

impl BatchItem {
    pub fn into_request(self) -> (String, PatternInput) {
        let mut input = PatternInput::new(self.text).with_parameters(self.parameters);
        input.context = self.context;
        (self.pattern_id, input)
    }
}

/// Read a JSON array of batch items
pub fn load_batch_file(path: &Path) -> Result<Vec<(String, PatternInput)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    let items: Vec<BatchItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse batch file {}", path.display()))?;
    Ok(items.into_iter().map(BatchItem::into_request).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemotePatternConfig;
    use pattern_core::{DynamicValue, PatternKind};
    use std::io::Write;

    #[tokio::test]
    async fn test_bootstrap_local_only() {
        let app = App::bootstrap(&AppConfig::default()).await.unwrap();
        assert!(app.bridge.is_none());
        assert!(app.registry.contains("summarize"));
        assert!(app.registry.contains("extract"));
        assert!(app.registry.contains("convert_case"));
    }

    #[tokio::test]
    async fn test_bootstrap_with_unreachable_worker() {
        let mut config = AppConfig::default();
        config.bridge = config.bridge.with_startup_attempts(0);
        config.bridge.base_url = "http://127.0.0.1:9".to_string();
        config.remote_patterns.push(RemotePatternConfig {
            id: "translate".to_string(),
            name: None,
            description: String::new(),
            version: None,
        });

        let app = App::bootstrap(&config).await.unwrap();
        assert_eq!(app.registry.list_by_kind(PatternKind::RemoteWorker).len(), 1);
        assert!(app.bridge.is_some());

        app.shutdown().await;
        let result = app
            .registry
            .execute("translate", PatternInput::new("bonjour"))
            .await
            .unwrap();
        assert!(!result.is_success());
    }

    #[test]
    fn test_load_batch_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"pattern_id": "convert_case", "text": "a b", "parameters": {{"case": "snake"}}}},
                {{"patternID": "summarize", "text": "One. Two.", "context": {{"source": "cli"}}}}
            ]"#
        )
        .unwrap();

        let requests = load_batch_file(file.path()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "convert_case");
        assert_eq!(
            requests[0].1.parameters["case"],
            DynamicValue::String("snake".into())
        );
        assert_eq!(requests[1].0, "summarize");
        assert!(requests[1].1.context.is_some());
    }

    #[test]
    fn test_load_batch_file_rejects_object() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"pattern_id": "x", "text": "y"}}"#).unwrap();
        assert!(load_batch_file(file.path()).is_err());
    }
}
