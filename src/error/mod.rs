//! Error handling module for gapcut

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for gapcut operations
#[derive(Error, Debug)]
pub enum GapCutError {
    /// Interval algebra or event protocol failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Input file or directory not found or inaccessible
    #[error("Input not found: {path}")]
    InputNotFound { path: String },

    /// File is not one of the configured video containers
    #[error("Unsupported file: {path} (expected one of: {expected})")]
    UnsupportedFile { path: String, expected: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds")]
    InvalidTimeFormat { time: String },

    /// None of the candidate executables could be started
    #[error("Failed to launch {program}: {message}")]
    ToolLaunch { program: String, message: String },

    /// External tool ran but reported failure
    #[error("{program} failed ({status}): {message}")]
    ToolFailed {
        program: String,
        status: String,
        message: String,
    },

    /// The original was moved aside for replacement and could not be put back
    #[error("Could not restore {original}; the original is now at {backup}: {message}")]
    OriginalStranded {
        original: String,
        backup: String,
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GapCutError {
    /// Errors that must stop a whole run instead of failing one file
    pub fn is_fatal(&self) -> bool {
        match self {
            GapCutError::Domain(e) => e.is_internal(),
            GapCutError::ConfigError { .. } => true,
            _ => false,
        }
    }
}

/// Result type alias for gapcut operations
pub type GapCutResult<T> = std::result::Result<T, GapCutError>;
