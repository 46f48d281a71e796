//! Configuration issues reported by [`FileConfig::validate`](super::FileConfig::validate).

use thiserror::Error;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the engine cannot start with this configuration.
    Error,
    /// Non-fatal: the engine starts but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A field that must be positive is zero.
    ZeroValue { field: String },
    /// A string field holds a value outside its accepted set.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// The roulette duration range is empty.
    InvertedRange { min: u64, max: u64 },
    /// A numeric field exceeds what the engine can use.
    TooLarge { field: String, max: u64 },
    /// The random source URL is not an http(s) URL.
    InvalidUrl { value: String },
    /// Roulette can be spun back to back.
    NoCooldown,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Configuration that cannot be turned into an engine configuration
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration: {}", join_messages(.0))]
    Invalid(Vec<ConfigIssue>),
}

impl ConfigValidationError {
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            ConfigValidationError::Invalid(issues) => issues,
        }
    }
}

fn join_messages(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
