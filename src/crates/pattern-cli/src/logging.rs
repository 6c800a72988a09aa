use tracing_subscriber::{fmt, EnvFilter};

/// Set to `1` to emit JSON log lines
pub const LOG_JSON_ENV: &str = "PATTERNS_LOG_JSON";

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
///
/// `verbose` forces the `debug` level; otherwise `RUST_LOG` applies,
/// defaulting to `info`.
pub fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if json_enabled(std::env::var(LOG_JSON_ENV).ok().as_deref()) {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

fn json_enabled(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true"))
}
