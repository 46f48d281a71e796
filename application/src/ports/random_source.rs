//! Random source port
//!
//! An unreliable external dependency used only by the roulette feature.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while requesting a random number
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Random source unreachable: {0}")]
    Unreachable(String),

    #[error("Random source returned HTTP {0}")]
    Status(u16),

    #[error("Malformed response from random source: {0}")]
    MalformedResponse(String),

    #[error("Timeout")]
    Timeout,
}

#[async_trait]
pub trait RandomSource: Send + Sync {
    /// Request one integer in the inclusive range `[min, max]`
    async fn request_random_int(&self, min: i64, max: i64) -> Result<i64, NetworkError>;
}
