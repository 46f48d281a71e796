//! Action provider port
//!
//! Defines the interface for applying and lifting the real-world mute effect.

use async_trait::async_trait;
use thiserror::Error;
use votemute_domain::SubjectId;

/// Errors reported by the platform when applying or removing a restriction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Subject not found: {0}")]
    SubjectNotFound(SubjectId),

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

/// Applies and removes the mute effect on the platform
///
/// Calls must be safe even if the provider's own view of the subject is
/// unknown. The mute ledger never relies on provider-side idempotence to
/// avoid double application.
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Silence the subject
    async fn apply_restriction(&self, subject: &SubjectId) -> Result<(), ProviderError>;

    /// Lift the silence on the subject
    async fn remove_restriction(&self, subject: &SubjectId) -> Result<(), ProviderError>;
}
