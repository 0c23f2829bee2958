//! Domain error model.

use thiserror::Error;

/// Result type used across the rule crates.
pub type DomainResult<T> = Result<T, DomainError>;

/// Rule-level error.
///
/// Only malformed input is an error here. Inconsistent-but-well-formed data
/// (e.g. more returns than issues) is reported as data by the rule that
/// detects it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or malformed date, time, or hall set.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A single inventory log entry was rejected.
    #[error("invalid log entry ({entry}): {reason}")]
    InvalidLogEntry { entry: String, reason: String },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Reject `entry`, recording its debug rendering so callers can point at it.
    pub fn invalid_log_entry(entry: &impl core::fmt::Debug, reason: impl Into<String>) -> Self {
        Self::InvalidLogEntry {
            entry: format!("{entry:?}"),
            reason: reason.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
