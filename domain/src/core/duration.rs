//! Mute duration value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::time::Duration;

/// A validated, strictly positive mute length in whole seconds (Value Object)
///
/// # Example
///
/// ```
/// use votemute_domain::MuteDuration;
///
/// assert_eq!(MuteDuration::parse("30s").unwrap().secs(), 30);
/// assert_eq!(MuteDuration::parse("1.5m").unwrap().secs(), 90);
/// assert_eq!(MuteDuration::parse("45").unwrap().secs(), 45);
/// assert!(MuteDuration::parse("0s").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct MuteDuration(NonZeroU64);

impl MuteDuration {
    /// Create a duration from whole seconds, rejecting zero
    pub fn from_secs(secs: u64) -> Result<Self, DomainError> {
        NonZeroU64::new(secs)
            .map(Self)
            .ok_or(DomainError::NonPositiveDuration)
    }

    /// Parse a user-supplied duration.
    ///
    /// Accepts a number with an optional `s` (seconds) or `m` (minutes) suffix.
    /// Fractional values are scaled first and then truncated toward zero.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        let invalid = || DomainError::InvalidDuration(input.to_string());

        let last = trimmed.chars().last().ok_or_else(invalid)?;
        let (number, scale) = match last.to_ascii_lowercase() {
            'm' => (&trimmed[..trimmed.len() - 1], 60.0),
            's' => (&trimmed[..trimmed.len() - 1], 1.0),
            _ => (trimmed, 1.0),
        };

        let value: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }

        let secs = (value * scale).trunc();
        if secs < 1.0 {
            return Err(DomainError::NonPositiveDuration);
        }
        if secs > u64::MAX as f64 {
            return Err(invalid());
        }
        Self::from_secs(secs as u64)
    }

    /// Length in whole seconds
    pub fn secs(&self) -> u64 {
        self.0.get()
    }

    /// Length as a [`std::time::Duration`]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs())
    }
}

impl std::fmt::Display for MuteDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.secs())
    }
}

impl std::str::FromStr for MuteDuration {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<u64> for MuteDuration {
    type Error = DomainError;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        Self::from_secs(secs)
    }
}

impl From<MuteDuration> for u64 {
    fn from(d: MuteDuration) -> Self {
        d.secs()
    }
}
