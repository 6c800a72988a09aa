//! Pattern abstraction, registry and dynamic values
//!
//! A *pattern* is a named text transformation (summarize, extract, ...).
//! This crate provides:
//!
//! - `value` - the `DynamicValue` tagged union and its JSON codec, including
//!   sentinel encoding for non-finite floats
//! - `pattern` - the `Pattern` trait and its descriptor, input and result types
//! - `registry` - the concurrency-safe `PatternRegistry` with single and batch execution
//! - `builtin` - in-process patterns installed at start-up
//! - `intent` - the `(pattern_id, text, parameters_json)` host capability call
//!
//! # Example
//!
//! ```rust,ignore
//! use pattern_core::{builtin, PatternInput, PatternRegistry};
//!
//! let registry = PatternRegistry::new();
//! builtin::register_builtin_patterns(&registry)?;
//!
//! let input = PatternInput::new(document).with_parameter("length", "short");
//! let result = registry.execute("summarize", input).await?;
//! println!("{}", result.output);
//! ```

pub mod builtin;
pub mod error;
pub mod intent;
pub mod pattern;
pub mod registry;
pub mod value;

pub use error::{PatternError, Result};
pub use intent::{run_intent, IntentOutcome};
pub use pattern::{Pattern, PatternDescriptor, PatternInput, PatternKind, PatternResult};
pub use registry::{PatternHandle, PatternRegistry};
pub use value::{CodecError, DynamicMap, DynamicValue};

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
