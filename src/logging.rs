//! Structured logging setup.
//!
//! Thin layer over `tracing-subscriber`: the level comes from the loaded
//! configuration, `RUST_LOG` overrides it when set, and the formatter is the
//! compact single-line one — the tool runs in a terminal next to the
//! operator's plot window, so pretty multi-line events would just scroll the
//! picks away.

use crate::config::Config;
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Parses a configuration log-level string.
pub fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(format!(
            "Invalid log level '{other}'. Must be one of: trace, debug, info, warn, error"
        )),
    }
}

/// Initializes the global subscriber from the loaded configuration.
///
/// `RUST_LOG` takes precedence over the configured level when present.
/// Fails if a global subscriber is already installed.
pub fn init_from_config(config: &Config) -> Result<(), String> {
    let level = parse_log_level(&config.application.log_level)?;
    init_with_level(level)
}

/// Initializes the global subscriber at an explicit level.
pub fn init_with_level(level: Level) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_ascii_lowercase()));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(true))
        .try_init()
        .map_err(|e| format!("Failed to initialize tracing: {e}"))
}
