//! Logging setup

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{GapCutError, GapCutResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Pretty,
    /// JSON format for structured logging
    Json,
}

/// Resolve the filter: explicit level first, then `RUST_LOG`, then `info`
fn build_filter(level: Option<&str>) -> GapCutResult<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| GapCutError::ConfigError {
            message: format!("invalid log level '{}': {}", level, e),
        }),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr unless `log_file` is given, in which case the file is
/// truncated and receives uncolored output.
pub fn init_logging(
    level: Option<&str>,
    format: LogFormat,
    log_file: Option<&Path>,
) -> GapCutResult<()> {
    let filter = build_filter(level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match (format, log_file) {
        (LogFormat::Pretty, None) => builder.with_writer(std::io::stderr).try_init(),
        (LogFormat::Json, None) => builder.json().with_writer(std::io::stderr).try_init(),
        (LogFormat::Pretty, Some(path)) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        (LogFormat::Json, Some(path)) => {
            let file = File::create(path)?;
            builder
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    result.map_err(|e| GapCutError::ConfigError {
        message: format!("failed to initialize logging: {}", e),
    })?;

    tracing::debug!("Logging initialized ({:?})", format);
    Ok(())
}
