// Domain errors - Error types for the interval algebra and event protocol

use thiserror::Error;

use crate::domain::model::Track;

/// Domain-specific error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Interval constructed with start after end
    #[error("Invalid interval: start ({start}) is after end ({end})")]
    InvalidInterval { start: f64, end: f64 },

    /// Combine called on two intervals that do not overlap
    #[error("Incompatible intervals: [{a_start}, {a_end}] and [{b_start}, {b_end}] do not overlap")]
    IncompatibleIntervals {
        a_start: f64,
        a_end: f64,
        b_start: f64,
        b_end: f64,
    },

    /// Set algebra across interval sets of different source files
    #[error("Mismatched files: cannot combine sets for '{left}' and '{right}'")]
    MismatchedFile { left: String, right: String },

    /// A start arrived while a start of the same kind was pending
    #[error("Two consecutive {track} starts encountered at {pending} and {received}; end expected")]
    UnmatchedStart {
        track: Track,
        pending: f64,
        received: f64,
    },

    /// An end arrived with nothing pending
    #[error("{track} end at {received} without a start")]
    UnmatchedEnd { track: Track, received: f64 },

    /// A single event line reported both a start and an end, or could not be read
    #[error("Malformed {track} event: {detail}")]
    MalformedEvent { track: Track, detail: String },

    /// The event stream ended while a start was still pending
    #[error("Event stream ended with an unterminated {track} starting at {pending}")]
    UnterminatedEvent { track: Track, pending: f64 },
}

impl DomainError {
    /// Whether the error is a violation of the upstream event protocol
    /// (as opposed to an internal consistency failure of the interval algebra)
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            DomainError::UnmatchedStart { .. }
                | DomainError::UnmatchedEnd { .. }
                | DomainError::MalformedEvent { .. }
                | DomainError::UnterminatedEvent { .. }
        )
    }

    /// Whether the error means the interval algebra itself is inconsistent
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DomainError::IncompatibleIntervals { .. } | DomainError::MismatchedFile { .. }
        )
    }
}
