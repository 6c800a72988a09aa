//! Host capability surface
//!
//! Automation and voice-command layers talk to the registry through a single
//! call: a `(pattern_id, text, parameters_json)` triple in, an
//! `(output, success)` pair out. Failures never escape as errors; the error
//! message is returned as the output with `success == false`.

use crate::error::{PatternError, Result};
use crate::pattern::PatternInput;
use crate::registry::PatternRegistry;
use crate::value::{self, DynamicMap, DynamicValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the host hands back to an automation caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentOutcome {
    pub output: String,
    pub success: bool,
}

/// Parse the JSON parameter string of an intent
///
/// An empty or blank string means no parameters. Anything other than a JSON
/// object is rejected as `InvalidInput`.
pub fn parse_parameters(pattern_id: &str, parameters_json: &str) -> Result<DynamicMap> {
    if parameters_json.trim().is_empty() {
        return Ok(DynamicMap::new());
    }

    match value::decode(parameters_json.as_bytes()) {
        Ok(DynamicValue::Object(map)) => Ok(map),
        Ok(other) => Err(PatternError::invalid_input(
            pattern_id,
            format!("parameters must be a JSON object, got {}", other.type_name()),
        )),
        Err(e) => Err(PatternError::invalid_input(
            pattern_id,
            format!("malformed parameters: {}", e),
        )),
    }
}

/// Run a pattern on behalf of an automation caller
pub async fn run_intent(
    registry: &PatternRegistry,
    pattern_id: &str,
    text: &str,
    parameters_json: &str,
) -> IntentOutcome {
    debug!(pattern_id, "Running intent");

    let outcome = async {
        let parameters = parse_parameters(pattern_id, parameters_json)?;
        let input = PatternInput::new(text).with_parameters(parameters);
        registry.execute(pattern_id, input).await
    }
    .await;

    match outcome {
        Ok(result) if result.is_success() => IntentOutcome {
            output: result.output,
            success: true,
        },
        Ok(result) => IntentOutcome {
            output: result.error().unwrap_or("pattern failed").to_string(),
            success: false,
        },
        Err(e) => IntentOutcome {
            output: e.to_string(),
            success: false,
        },
    }
}
