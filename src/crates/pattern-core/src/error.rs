//! Error types for pattern registration and execution

use thiserror::Error;

/// Errors that can occur while registering, resolving or executing patterns
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    /// A pattern with the same id is already registered
    #[error("Pattern already registered: {0}")]
    DuplicateId(String),

    /// No pattern is registered under the requested id
    #[error("Pattern not found: {0}")]
    NotFound(String),

    /// The pattern rejected its input during validation
    #[error("Invalid input for {pattern}: {message}")]
    InvalidInput { pattern: String, message: String },

    /// The handler ran but could not produce a result
    #[error("Pattern execution failed: {0}")]
    ExecutionFailed(String),

    /// A remote request exceeded its deadline
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// The worker bridge is not in the running state
    #[error("Backend is not running")]
    BackendNotRunning,

    /// Transport-level failure talking to the worker
    #[error("Communication with backend failed{}: {message}", status_suffix(.status))]
    CommunicationFailed {
        status: Option<u16>,
        message: String,
    },

    /// The worker replied with something we could not interpret
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    /// Anything else
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl PatternError {
    /// Build an `InvalidInput` error for the given pattern id
    pub fn invalid_input(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Get the canonical error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "E_DUPLICATE_ID",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::InvalidInput { .. } => "E_INVALID_INPUT",
            Self::ExecutionFailed(_) => "E_EXECUTION",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::BackendNotRunning => "E_BACKEND_NOT_RUNNING",
            Self::CommunicationFailed { .. } => "E_COMMUNICATION",
            Self::InvalidResponse(_) => "E_INVALID_RESPONSE",
            Self::Unknown(_) => "E_UNKNOWN",
        }
    }

    /// Check if a caller could reasonably retry the operation
    ///
    /// The registry never retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::BackendNotRunning | Self::CommunicationFailed { .. }
        )
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

/// Result type for pattern operations
pub type Result<T> = std::result::Result<T, PatternError>;
