//! Validation errors for the domain model
//!
//! Validation failures are recovered locally by the caller (typically by
//! surfacing an inline message). They never enter [`crate::AppState`].

/// Input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required form field was empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Signup password and confirmation differ
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Percentage outside 0..=100
    #[error("percentage out of range: {0} (expected 0-100)")]
    PercentageOutOfRange(u32),

    /// Retention period not in the enumerated set
    #[error("unsupported retention period: {0} days (expected 30, 90 or 180)")]
    UnsupportedRetention(u32),

    /// File extension not permitted by the current settings
    #[error("file type not allowed: {0}")]
    FileTypeNotAllowed(String),

    /// Activity log capacity must hold at least one entry
    #[error("activity capacity must be greater than zero")]
    ZeroCapacity,

    /// Retention day length is zero or too long to schedule a full window
    #[error("retention day of {0}s is out of range")]
    RetentionDayOutOfRange(u64),
}

impl ValidationError {
    /// Human-readable message suitable for inline display
    #[inline]
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField(_) => "Please fill in all fields".to_string(),
            Self::PasswordMismatch => "Passwords do not match".to_string(),
            other => other.to_string(),
        }
    }
}

/// Agent status transition outside the allowed table
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal agent transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: crate::types::AgentStatus,
    pub to: crate::types::AgentStatus,
}
