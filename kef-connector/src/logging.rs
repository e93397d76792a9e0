//! Logging setup for hosts embedding kef-connector
//!
//! The library itself only emits `tracing` events. Hosts that do not install
//! their own subscriber can call [`init_logging`] once at startup.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber installed
    Silent,
    /// Compact stderr output
    Development,
    /// Verbose stderr output with source locations
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Initialize logging with the specified mode
///
/// # Environment Variables
///
/// - `KEF_LOG_LEVEL`: Override the filter (e.g. "debug", "kef_connector=trace")
/// - `RUST_LOG`: Used when `KEF_LOG_LEVEL` is not set
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(create_env_filter("info"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(create_env_filter("debug"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Parse a mode name as used by `KEF_LOG_MODE`
pub fn mode_from_name(name: &str) -> Option<LoggingMode> {
    match name.to_ascii_lowercase().as_str() {
        "silent" => Some(LoggingMode::Silent),
        "development" => Some(LoggingMode::Development),
        "debug" => Some(LoggingMode::Debug),
        _ => None,
    }
}

/// Initialize logging from `KEF_LOG_MODE` (silent, development, debug)
///
/// Defaults to Development when unset or unrecognized.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var("KEF_LOG_MODE")
        .ok()
        .and_then(|m| mode_from_name(&m))
        .unwrap_or(LoggingMode::Development);

    init_logging(mode)
}

fn create_env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var("KEF_LOG_LEVEL") {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}

/// Check if a global subscriber has already been set
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
