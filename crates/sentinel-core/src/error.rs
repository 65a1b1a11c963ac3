//! Error types for the Sentinel engine
//!
//! Provides error handling for:
//! - Proof lifecycle misuse (calling an operation in the wrong state)
//! - Durable session store failures
//! - Analysis backend failures (recovered by the fallback score)
//! - Timer scheduling outside a runtime
//! - Configuration loading
//!
//! Not-found conditions (update/delete against an unknown id) are not
//! errors anywhere in the engine; they are silent no-ops.

use sentinel_state::{ProofStatus, ValidationError};
use std::path::PathBuf;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// User input rejected
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Proof lifecycle misuse
    #[error("proof error: {0}")]
    Proof(#[from] ProofError),

    /// Session persistence failed
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Deferred work could not be scheduled
    #[error("timer error: {0}")]
    Timer(#[from] TimerError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Check if the caller can recover by correcting input or retrying
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Proof(_) | Self::Session(SessionError::Io { .. })
        )
    }

    /// Inline message for validation failures
    #[inline]
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(e) => Some(e.user_message()),
            _ => None,
        }
    }
}

/// Proof lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    /// Operation not permitted in the current status
    #[error("cannot {operation} proof while {actual:?} (requires {required:?})")]
    InvalidState {
        /// `generate` or `submit`
        operation: &'static str,
        /// Status the operation requires
        required: ProofStatus,
        /// Status found
        actual: ProofStatus,
    },
}

/// Durable session store errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Filesystem failure
    #[error("session store i/o at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be (de)serialized
    #[error("session record serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Analysis backend errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// Backend could not be reached
    #[error("analysis backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with an error
    #[error("analysis backend rejected request: {0}")]
    Rejected(String),
}

/// Timer scheduling errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// Called outside a tokio runtime
    #[error("no async runtime available to schedule deferred work")]
    NoRuntime,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid configuration value: {0}")]
    Invalid(#[from] ValidationError),
}
