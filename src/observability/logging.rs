//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the level from CLI verbosity, config, or `RUST_LOG`
//!
//! # Design Decisions
//! - `RUST_LOG` wins over everything else when set
//! - Dependencies are held at `warn` unless the filter says otherwise
//! - Quiet mode installs a filter that drops every event

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Initializes the global subscriber.
///
/// `level_override` comes from CLI verbosity and takes precedence over the
/// configured level.
pub fn init_logging(
    config: &ObservabilityConfig,
    level_override: Option<Level>,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = if config.quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = level_override.unwrap_or_else(|| parse_level(&config.log_level));
            EnvFilter::new(default_directives(level))
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    }
}

/// Filter directives for `level`, keeping dependency noise down.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("{level},ws_bridge={level},tower_http={level},hyper=warn,rustls=warn,tungstenite=warn")
}

/// Parses a log level string, defaulting to INFO.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
