//! Standardized logging configuration.
//!
//! Provides a consistent tracing setup for every process embedding the
//! engine, with human-readable console output by default and JSON for log
//! aggregation.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: standard tracing filter (e.g. `info`, `strat_manager=debug`)
//! - `LOG_FORMAT`: `pretty` (default), `compact`, or `json`
//! - `LOG_LEVEL`: default level when `RUST_LOG` is unset

use std::env;

use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with colors (default for terminals)
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for machine parsing
    Json,
}

impl LogFormat {
    /// Parse format from string, defaulting to pretty
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Default log level filter when `RUST_LOG` is unset
    pub default_level: String,
    /// Include target (module path)
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_level: "info".to_string(),
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            format: env::var("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            default_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            include_target: true,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Safe to call once per process; subsequent calls return an error from the
/// underlying subscriber, which is swallowed so tests can initialize freely.
pub fn init_logging(config: LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.clone()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(config.include_target);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!("logging already initialized; keeping existing subscriber");
    }
}
