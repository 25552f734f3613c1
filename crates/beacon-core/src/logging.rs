//! Logging initialization for the tracking client.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for hosts that have no subscriber of their own.
///
/// The level comes from `RUST_LOG` when set, otherwise from `level`
/// (usually the configured log level). Safe to call more than once; later
/// calls are no-ops when a global subscriber is already installed.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
