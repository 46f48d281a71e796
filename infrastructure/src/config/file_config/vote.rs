//! Vote-mute configuration from TOML (`[vote]` section)
//!
//! ```toml
//! [vote]
//! lifetime_secs = 60     # proposals close after this long
//! rule = "majority"      # or "unanimous", "atleast:2", "75%"
//! ```

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use votemute_domain::QuorumRule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVoteConfig {
    /// Seconds an open proposal stays open
    pub lifetime_secs: u64,
    /// Quorum rule: "majority", "unanimous", "atleast:N", "N%"
    pub rule: String,
}

impl Default for FileVoteConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: 60,
            rule: "majority".to_string(),
        }
    }
}

impl FileVoteConfig {
    /// Parse the rule string, reporting an issue instead of failing.
    pub fn parse_rule(&self) -> (Option<QuorumRule>, Vec<ConfigIssue>) {
        match self.rule.parse::<QuorumRule>() {
            Ok(rule) => (Some(rule), Vec::new()),
            Err(e) => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "vote.rule".to_string(),
                        value: self.rule.clone(),
                        valid_values: vec![
                            "majority".to_string(),
                            "unanimous".to_string(),
                            "atleast:N".to_string(),
                            "N%".to_string(),
                        ],
                    },
                    format!("vote.rule: {}", e),
                )],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_rule().1;
        if self.lifetime_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "vote.lifetime_secs".to_string(),
                },
                "vote.lifetime_secs must be positive",
            ));
        }
        issues
    }
}
