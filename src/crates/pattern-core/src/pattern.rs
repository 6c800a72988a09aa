//! Pattern abstraction
//!
//! A pattern is a named, versioned text-processing capability. Every handler,
//! whether it runs in-process or delegates to a remote worker, implements the
//! [`Pattern`] trait and is described by an immutable [`PatternDescriptor`].

use crate::error::Result;
use crate::value::{DynamicMap, DynamicValue};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a pattern's work is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    /// In-process handler
    Local,
    /// Out-of-process worker reached through the bridge
    RemoteWorker,
    /// Third-party API
    RemoteApi,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Local => write!(f, "local"),
            PatternKind::RemoteWorker => write!(f, "remote-worker"),
            PatternKind::RemoteApi => write!(f, "remote-api"),
        }
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(PatternKind::Local),
            "remote-worker" | "remote_worker" | "worker" => Ok(PatternKind::RemoteWorker),
            "remote-api" | "remote_api" | "api" => Ok(PatternKind::RemoteApi),
            other => Err(format!("unknown pattern kind: {}", other)),
        }
    }
}

/// Immutable identity record for a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDescriptor {
    /// Unique key in the registry
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What the pattern does
    #[serde(default)]
    pub description: String,
    /// Handler version
    #[serde(default = "default_version")]
    pub version: String,
    /// Where the pattern executes
    pub kind: PatternKind,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl PatternDescriptor {
    /// Create a descriptor with an empty description and default version
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: PatternKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: default_version(),
            kind,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Input handed to a pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternInput {
    /// Text to process
    pub text: String,
    /// Pattern-specific parameters
    #[serde(default)]
    pub parameters: DynamicMap,
    /// Optional caller context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DynamicMap>,
}

impl PatternInput {
    /// Create an input with no parameters
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: DynamicMap::new(),
            context: None,
        }
    }

    /// Add a parameter
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Replace all parameters
    pub fn with_parameters(mut self, parameters: DynamicMap) -> Self {
        self.parameters = parameters;
        self
    }

    /// Add a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.context
            .get_or_insert_with(DynamicMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a string parameter
    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(DynamicValue::as_str)
    }
}

/// Uniform result returned by every pattern
///
/// `success` and `error` are kept private so the pair stays consistent:
/// a failed result always carries an error and a successful one never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    /// Produced text
    pub output: String,
    /// Optional handler metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DynamicMap>,
    /// Execution time in seconds
    pub duration: f64,
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl PatternResult {
    /// Create a successful result
    pub fn success(output: impl Into<String>, duration: f64) -> Self {
        Self {
            output: output.into(),
            metadata: None,
            duration: duration.max(0.0),
            success: true,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>, duration: f64) -> Self {
        Self {
            output: String::new(),
            metadata: None,
            duration: duration.max(0.0),
            success: false,
            error: Some(error.into()),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.metadata
            .get_or_insert_with(DynamicMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the metadata map
    pub fn with_metadata_map(mut self, metadata: Option<DynamicMap>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Capability contract implemented by every pattern handler
///
/// `validate` is always called before `execute`; a handler whose validation
/// fails is never executed.
#[async_trait]
pub trait Pattern: Send + Sync {
    /// Identity of this handler
    fn descriptor(&self) -> &PatternDescriptor;

    fn id(&self) -> &str {
        &self.descriptor().id
    }

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn version(&self) -> &str {
        &self.descriptor().version
    }

    fn kind(&self) -> PatternKind {
        self.descriptor().kind
    }

    /// Check whether `input` is acceptable. Defaults to requiring non-blank text.
    fn validate(&self, input: &PatternInput) -> bool {
        !input.text.trim().is_empty()
    }

    /// Run the pattern
    async fn execute(&self, input: PatternInput) -> Result<PatternResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_and_display() {
        for kind in [PatternKind::Local, PatternKind::RemoteWorker, PatternKind::RemoteApi] {
            assert_eq!(kind.to_string().parse::<PatternKind>().unwrap(), kind);
        }
        assert!("quantum".parse::<PatternKind>().is_err());
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&PatternKind::RemoteWorker).unwrap();
        assert_eq!(json, r#""remote-worker""#);
    }

    #[test]
    fn test_descriptor_builder() {
        let descriptor = PatternDescriptor::new("summarize", "Summarize", PatternKind::Local)
            .with_description("Condense text")
            .with_version("2.1.0");

        assert_eq!(descriptor.id, "summarize");
        assert_eq!(descriptor.version, "2.1.0");
        assert_eq!(descriptor.description, "Condense text");
    }

    #[test]
    fn test_descriptor_deserialize_defaults() {
        let descriptor: PatternDescriptor =
            serde_json::from_str(r#"{"id":"translate","name":"Translate","kind":"remote-worker"}"#)
                .unwrap();
        assert_eq!(descriptor.version, "1.0.0");
        assert!(descriptor.description.is_empty());
    }

    #[test]
    fn test_input_builder() {
        let input = PatternInput::new("hello")
            .with_parameter("length", "short")
            .with_parameter("limit", 3)
            .with_context("source", "clipboard");

        assert_eq!(input.parameter_str("length"), Some("short"));
        assert_eq!(input.parameters["limit"], DynamicValue::Int(3));
        assert!(input.context.as_ref().unwrap().contains_key("source"));
    }

    #[test]
    fn test_result_invariants() {
        let ok = PatternResult::success("done", 0.25);
        assert!(ok.is_success());
        assert!(ok.error().is_none());

        let failed = PatternResult::failure("boom", -1.0);
        assert!(!failed.is_success());
        assert_eq!(failed.error(), Some("boom"));
        assert_eq!(failed.duration, 0.0);
    }
}
