// src/logging.rs

//! Logging setup for `ganttline` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `GANTTLINE_LOG` environment variable, either a bare level ("debug")
//!    or full filter directives ("ganttline::schedule=trace,info")
//! 3. default to `info`
//!
//! Logs go to STDERR; stdout carries the rendered schedule.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "GANTTLINE_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(level_from_log_level(lvl).as_str()),
        None => match std::env::var(LOG_ENV_VAR) {
            Ok(raw) => filter_from_env_value(&raw)?,
            Err(_) => EnvFilter::new("info"),
        },
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Build a filter from the `GANTTLINE_LOG` value.
///
/// Bare level names are accepted case-insensitively (including "warning");
/// anything else is handed to `EnvFilter` as directives.
pub fn filter_from_env_value(raw: &str) -> Result<EnvFilter> {
    if let Some(level) = parse_level_str(raw) {
        return Ok(EnvFilter::new(level.as_str()));
    }
    EnvFilter::try_new(raw.trim())
        .with_context(|| format!("invalid {LOG_ENV_VAR} value {raw:?}"))
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
