//! # Logger Module
//!
//! Logging through `tracing-subscriber`, always written to stderr: stdout carries the
//! result record read by the orchestrator and nothing else.
//!
//! ## Components
//!
//! - `LoggerLevel`: DEBUG, INFO, WARN and ERROR.
//! - `LogFormat`: Either Text or JSON output format.
//! - `LoggerSettings`: level and format, read from the `[logger]` settings section.
//! - `setup_logging`: installs the global subscriber.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Standard Rust log filtering (e.g., `RUST_LOG=ch_reconcile::framework=debug`),
//!   takes precedence over the configured level
//! - `CH_RECONCILE_LOGGER__LEVEL`: Log level (DEBUG, INFO, WARN, ERROR)
//! - `CH_RECONCILE_LOGGER__FORMAT`: Text or JSON (default: Text)
//!
//! Statements are logged at DEBUG with their secrets masked.

use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub enum LoggerLevel {
    #[serde(alias = "DEBUG", alias = "debug")]
    Debug,
    #[serde(alias = "INFO", alias = "info")]
    Info,
    #[serde(alias = "WARN", alias = "warn")]
    Warn,
    #[serde(alias = "ERROR", alias = "error")]
    Error,
}

impl LoggerLevel {
    pub fn to_tracing_level(&self) -> LevelFilter {
        match self {
            LoggerLevel::Debug => LevelFilter::DEBUG,
            LoggerLevel::Info => LevelFilter::INFO,
            LoggerLevel::Warn => LevelFilter::WARN,
            LoggerLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub enum LogFormat {
    #[serde(alias = "json", alias = "JSON")]
    Json,
    #[serde(alias = "text", alias = "TEXT")]
    Text,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LoggerSettings {
    #[serde(default = "default_log_level")]
    pub level: LoggerLevel,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> LoggerLevel {
    LoggerLevel::Info
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggerSettings {
    fn default() -> Self {
        LoggerSettings {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Failed to install the log subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

pub fn setup_logging(settings: &LoggerSettings, debug: bool) -> Result<(), LoggerError> {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        settings.level.to_tracing_level()
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let format_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    if settings.format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(format_layer.json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(format_layer.compact())
            .try_init()?;
    }

    Ok(())
}
