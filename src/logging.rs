//! Logging setup
//!
//! Installs a global `tracing` subscriber from [`LoggingConfig`]. `RUST_LOG` takes
//! precedence over the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Logging initialization errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Unknown log format: {0}")]
    UnknownFormat(String),

    #[error("Invalid log filter '{filter}': {error}")]
    Filter { filter: String, error: String },

    #[error("Failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = format!("cubequery={}", config.level);
    EnvFilter::try_new(&directive).map_err(|e| LoggingError::Filter {
        filter: directive,
        error: e.to_string(),
    })
}

/// Install the global subscriber; fails if one is already set
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let format = LogFormat::from_str(&config.format)
        .ok_or_else(|| LoggingError::UnknownFormat(config.format.clone()))?;
    let filter = build_filter(config)?;

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()?;

    tracing::debug!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}
