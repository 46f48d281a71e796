//! Roulette configuration from TOML (`[roulette]` section)
//!
//! ```toml
//! [roulette]
//! cooldown_secs = 30
//! min_duration_secs = 10
//! max_duration_secs = 60
//! source = "http"        # or "local"
//! api_url = "https://www.randomnumberapi.com/api/v1.0/random"
//! timeout_secs = 10
//! ```

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RANDOM_API_URL: &str = "https://www.randomnumberapi.com/api/v1.0/random";

/// Largest roulette duration the random source can be asked for
pub const MAX_DURATION_SECS: u64 = i64::MAX as u64;

/// Where roulette draws its numbers from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomSourceKind {
    /// Remote random-number HTTP API
    Http,
    /// In-process generator
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRouletteConfig {
    pub cooldown_secs: u64,
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    /// "http" or "local"
    pub source: String,
    pub api_url: String,
    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl Default for FileRouletteConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 30,
            min_duration_secs: 10,
            max_duration_secs: 60,
            source: "http".to_string(),
            api_url: DEFAULT_RANDOM_API_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl FileRouletteConfig {
    pub fn parse_source(&self) -> (Option<RandomSourceKind>, Vec<ConfigIssue>) {
        match self.source.to_lowercase().as_str() {
            "http" => (Some(RandomSourceKind::Http), Vec::new()),
            "local" => (Some(RandomSourceKind::Local), Vec::new()),
            _ => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "roulette.source".to_string(),
                        value: self.source.clone(),
                        valid_values: vec!["http".to_string(), "local".to_string()],
                    },
                    format!("roulette.source: unknown value '{}'", self.source),
                )],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_source().1;

        if self.min_duration_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "roulette.min_duration_secs".to_string(),
                },
                "roulette.min_duration_secs must be positive",
            ));
        }
        if self.min_duration_secs > self.max_duration_secs {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvertedRange {
                    min: self.min_duration_secs,
                    max: self.max_duration_secs,
                },
                format!(
                    "roulette duration range {}..={} is empty",
                    self.min_duration_secs, self.max_duration_secs
                ),
            ));
        }
        for (field, value) in [
            ("roulette.min_duration_secs", self.min_duration_secs),
            ("roulette.max_duration_secs", self.max_duration_secs),
        ] {
            if value > MAX_DURATION_SECS {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::TooLarge {
                        field: field.to_string(),
                        max: MAX_DURATION_SECS,
                    },
                    format!("{} must be at most {}", field, MAX_DURATION_SECS),
                ));
            }
        }
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "roulette.timeout_secs".to_string(),
                },
                "roulette.timeout_secs must be positive",
            ));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidUrl {
                    value: self.api_url.clone(),
                },
                format!("roulette.api_url: '{}' is not an http(s) URL", self.api_url),
            ));
        }
        if self.cooldown_secs == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::NoCooldown,
                "roulette.cooldown_secs is 0, roulette can be spun back to back",
            ));
        }

        issues
    }
}
