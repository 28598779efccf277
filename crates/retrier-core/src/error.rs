//! Configuration errors.
//!
//! These are raised when a retry configuration is declared or merged, never
//! while an operation is being retried.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field failed its type or range check.
    #[error("{field} {reason}")]
    InvalidConfigurationValue { field: &'static str, reason: String },

    /// An override named a field the configuration does not have.
    #[error("{0} is not a valid configuration")]
    UnknownConfigurationKey(String),

    /// Backoff strategy identifier not recognised.
    #[error("incorrect backoff type: {0}")]
    InvalidStrategyKind(String),

    /// Strategy cannot produce enough intervals for the requested retries.
    #[error("backoff table has {available} intervals, {requested} requested")]
    BackoffTableTooShort { requested: usize, available: usize },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidConfigurationValue {
            field,
            reason: reason.into(),
        }
    }
}
