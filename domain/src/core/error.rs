//! Domain error types

use thiserror::Error;

/// Domain-level validation errors
///
/// These are raised before a request reaches the mute ledger or vote tally;
/// the engine itself only ever sees validated values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid duration '{0}': use e.g. 30s, 1m or a number of seconds")]
    InvalidDuration(String),

    #[error("Duration must be positive")]
    NonPositiveDuration,

    #[error("Invalid quorum rule: {0}")]
    InvalidQuorumRule(String),
}

impl DomainError {
    /// Check if this error came from duration validation
    pub fn is_duration_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidDuration(_) | DomainError::NonPositiveDuration
        )
    }
}
