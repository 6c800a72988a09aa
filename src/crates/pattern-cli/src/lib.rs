//! Library side of the `patterns` command-line tool

pub mod app;
pub mod config;
pub mod health;
pub mod logging;

pub use app::{load_batch_file, App};
pub use config::{AppConfig, RemotePatternConfig};
pub use health::{HealthReport, HealthStatus};
pub use logging::init_logging;

/// Version line printed by `patterns version`
pub fn version_info() -> String {
    format!(
        "patterns {} (pattern-core {})",
        env!("CARGO_PKG_VERSION"),
        pattern_core::version()
    )
}
