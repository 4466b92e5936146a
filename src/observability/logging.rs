//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Translate the `--log` level names into a tracing filter
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, plain format for development
//! - `RUST_LOG` overrides the configured level

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log level `{0}` (expected DEBUG, INFO, WARNING or ERROR)")]
    UnknownLevel(String),

    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Map a level name to a filter. `WARNING` and `WARN` are both accepted.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::TRACE),
        "DEBUG" => Some(LevelFilter::DEBUG),
        "INFO" => Some(LevelFilter::INFO),
        "WARNING" | "WARN" => Some(LevelFilter::WARN),
        "ERROR" => Some(LevelFilter::ERROR),
        _ => None,
    }
}

/// Install the global subscriber.
pub fn init(level: &str, json: bool) -> Result<(), LoggingError> {
    let level = parse_level(level).ok_or_else(|| LoggingError::UnknownLevel(level.to_string()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=warn", level)));

    let layer = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .flatten_event(true)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_filter(filter).boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}
