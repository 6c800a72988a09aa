//! Error types for the worker bridge.

use pattern_core::PatternError;
use std::time::Duration;
use thiserror::Error;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur when talking to the worker.
///
/// Transport errors are classified here so callers never see a raw
/// `reqwest::Error`.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge is not in the running state.
    #[error("Backend not running: {0}")]
    NotRunning(String),

    /// Request exceeded its deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport failure or non-success HTTP status.
    #[error("Communication failed{}: {message}", status_suffix(.status))]
    CommunicationFailed {
        status: Option<u16>,
        message: String,
    },

    /// Reply could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to serialize a request.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

impl BridgeError {
    /// Classify a transport-level failure.
    pub(crate) fn transport(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            BridgeError::Timeout(deadline)
        } else {
            BridgeError::CommunicationFailed {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

/// Normalize bridge failures into the registry's error kinds.
impl From<BridgeError> for PatternError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::NotRunning(_) => PatternError::BackendNotRunning,
            BridgeError::Timeout(deadline) => PatternError::Timeout(deadline.as_millis() as u64),
            BridgeError::CommunicationFailed { status, message } => {
                PatternError::CommunicationFailed { status, message }
            }
            BridgeError::InvalidResponse(msg) => PatternError::InvalidResponse(msg),
            BridgeError::Serialization(msg) => {
                PatternError::Unknown(format!("Failed to encode request: {}", msg))
            }
            BridgeError::Config(msg) => PatternError::Unknown(msg),
        }
    }
}
