//! Error types for the presence-points engine.

use std::time::Duration;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures raised by the external presence source.
///
/// This is a closed set: hosts wrap whatever their transport throws into
/// one of these variants so the engine can decide between aborting the run
/// and surfacing a backoff demand.
#[derive(Debug, Clone, Error, serde::Serialize)]
pub enum SourceError {
    /// The source could not be reached or authenticated. Fatal to the run.
    #[error("presence source unavailable: {reason}")]
    Unavailable { reason: String },

    /// The source demands backoff. The engine never sleeps or retries on
    /// its own; it reports the required wait and lets the caller decide.
    #[error("presence source rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// The member stream failed after a successful connect.
    #[error("presence stream failed: {reason}")]
    Stream { reason: String },
}

impl SourceError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        SourceError::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn stream(reason: impl Into<String>) -> Self {
        SourceError::Stream {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while scoring and persisting observations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Presence source failure (connect or mid-stream)
    #[error(transparent)]
    Source(#[from] SourceError),

    /// An observation whose identifier or timestamp cannot be used.
    /// Skipped and counted; never aborts the run.
    #[error("malformed observation: {0}")]
    MalformedObservation(String),

    /// Database operation failed (connection, query execution, constraint)
    #[error("store write failed: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    /// The wait the presence source demanded, when this is a rate limit.
    ///
    /// Lets callers branch on the backoff condition without destructuring
    /// the source error themselves.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            EngineError::Source(SourceError::RateLimited { retry_after }) => Some(*retry_after),
            _ => None,
        }
    }

    /// True when the whole run must be abandoned rather than the single
    /// observation that raised the error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Source(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_only_set_for_rate_limits() {
        let rate_limited = EngineError::Source(SourceError::RateLimited {
            retry_after: Duration::from_secs(42),
        });
        assert_eq!(rate_limited.retry_after(), Some(Duration::from_secs(42)));

        let unavailable = EngineError::Source(SourceError::unavailable("auth failed"));
        assert_eq!(unavailable.retry_after(), None);
        assert!(unavailable.is_fatal());

        let malformed = EngineError::MalformedObservation("empty user id".to_string());
        assert_eq!(malformed.retry_after(), None);
        assert!(!malformed.is_fatal());
    }
}
