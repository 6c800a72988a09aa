//! Wire messages exchanged with the worker
//!
//! Parameter and metadata values travel through the `DynamicValue` codec,
//! so non-finite floats survive the trip as string sentinels.

use pattern_core::{DynamicMap, PatternInput, PatternResult};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Allocate a fresh request id
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Execution request sent to `POST /execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Correlation id echoed back by the worker
    #[serde(rename = "requestID")]
    pub request_id: String,

    #[serde(rename = "patternID")]
    pub pattern_id: String,

    pub text: String,

    #[serde(default)]
    pub parameters: DynamicMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DynamicMap>,
}

impl RpcRequest {
    /// Build a request with a newly allocated id
    pub fn new(pattern_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            request_id: new_request_id(),
            pattern_id: pattern_id.into(),
            text: text.into(),
            parameters: DynamicMap::new(),
            context: None,
        }
    }

    /// Build a request carrying a pattern input
    pub fn from_input(pattern_id: impl Into<String>, input: PatternInput) -> Self {
        Self {
            request_id: new_request_id(),
            pattern_id: pattern_id.into(),
            text: input.text,
            parameters: input.parameters,
            context: input.context,
        }
    }

    pub fn with_parameters(mut self, parameters: DynamicMap) -> Self {
        self.parameters = parameters;
        self
    }

    /// Uncorrelated body understood by older workers
    pub fn to_legacy_body(&self) -> LegacyRequest<'_> {
        LegacyRequest {
            pattern_id: &self.pattern_id,
            text: &self.text,
            parameters: &self.parameters,
        }
    }
}

/// `{pattern_id, text, parameters}` request body
#[derive(Debug, Serialize)]
pub struct LegacyRequest<'a> {
    pub pattern_id: &'a str,
    pub text: &'a str,
    pub parameters: &'a DynamicMap,
}

/// Execution reply from the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Empty when the worker did not echo an id
    #[serde(
        rename = "requestID",
        alias = "request_id",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub request_id: String,

    pub success: bool,

    #[serde(default)]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DynamicMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Worker-reported execution time in seconds
    #[serde(default)]
    pub duration: f64,
}

impl RpcResponse {
    /// Convert into the registry's result type
    ///
    /// A failed reply without an error message gets a generic one so the
    /// result still satisfies the success/error pairing.
    pub fn into_pattern_result(self) -> PatternResult {
        let result = if self.success {
            PatternResult::success(self.output.unwrap_or_default(), self.duration)
        } else {
            let error = self
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "Remote execution failed".to_string());
            PatternResult::failure(error, self.duration)
        };
        result.with_metadata_map(self.metadata)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
