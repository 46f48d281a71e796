//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to the application's
//! [`EngineConfig`] only after validation.

mod logging;
mod roulette;
mod vote;

pub use logging::FileLoggingConfig;
pub use roulette::{DEFAULT_RANDOM_API_URL, FileRouletteConfig, RandomSourceKind};
pub use vote::FileVoteConfig;

use super::issue::{ConfigIssue, ConfigValidationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use votemute_application::{EngineConfig, RouletteConfig, VoteConfig};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Vote-mute settings
    pub vote: FileVoteConfig,
    /// Roulette settings
    pub roulette: FileRouletteConfig,
    /// Event log settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.vote.validate();
        issues.extend(self.roulette.validate());
        issues
    }

    /// Build the engine configuration, failing on any error-level issue.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigValidationError> {
        let errors: Vec<ConfigIssue> = self
            .validate()
            .into_iter()
            .filter(ConfigIssue::is_error)
            .collect();
        let rule = match self.vote.parse_rule().0 {
            Some(rule) if errors.is_empty() => rule,
            _ => return Err(ConfigValidationError::Invalid(errors)),
        };

        Ok(EngineConfig {
            vote: VoteConfig {
                lifetime: Duration::from_secs(self.vote.lifetime_secs),
                rule,
            },
            roulette: RouletteConfig {
                cooldown: Duration::from_secs(self.roulette.cooldown_secs),
                min_duration_secs: self.roulette.min_duration_secs,
                max_duration_secs: self.roulette.max_duration_secs,
            },
        })
    }
}
