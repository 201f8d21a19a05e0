//! Error types for jobscout.
//!
//! Library crates use [`JobscoutError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all jobscout operations.
#[derive(Debug, thiserror::Error)]
pub enum JobscoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error after the retry budget is exhausted.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or payload parsing error inside a connector.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Seen-store or lock-file storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Another pipeline run holds the lock. Expected, not a failure.
    #[error("another run is active (lock at {path:?})")]
    Locked { path: PathBuf },

    /// The scoring collaborator was unreachable or returned unusable data.
    /// Demotes the whole ranking phase, never a single posting.
    #[error("ranking error: {0}")]
    Ranking(String),

    /// A single posting's generation call failed or returned malformed output.
    #[error("generation error: {0}")]
    Generation(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty title, invalid URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, JobscoutError>;

impl JobscoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is the lock-contention outcome, which callers treat as
    /// a clean early exit rather than a failure.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = JobscoutError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = JobscoutError::Ranking("embedding count mismatch".into());
        assert!(err.to_string().contains("embedding count mismatch"));
    }

    #[test]
    fn locked_is_not_a_failure_class() {
        let err = JobscoutError::Locked {
            path: PathBuf::from("/tmp/.lock"),
        };
        assert!(err.is_locked());
        assert!(!JobscoutError::Network("boom".into()).is_locked());
    }
}
