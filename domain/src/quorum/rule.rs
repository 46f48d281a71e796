//! Quorum rules for vote-mute resolution
//!
//! A rule turns the size of the live eligible set into the number of valid
//! votes a proposal needs before it becomes binding.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Rule for determining when a vote-mute proposal resolves
///
/// - `Majority`: more than half of the eligible voters (default)
/// - `Unanimous`: every eligible voter
/// - `AtLeast(n)`: a fixed number of valid votes
/// - `Percentage(p)`: at least p% of the eligible voters
///
/// Every rule requires at least one valid vote, so a proposal whose target
/// sits alone in its channel can never resolve on its own.
///
/// # Example
///
/// ```
/// use votemute_domain::QuorumRule;
///
/// let rule = QuorumRule::Majority;
/// assert_eq!(rule.required_votes(3), 2);
/// assert!(rule.is_met(2, 3));
/// assert!(!rule.is_met(1, 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum QuorumRule {
    /// floor(eligible / 2) + 1
    #[default]
    Majority,

    /// All eligible voters
    Unanimous,

    /// At least n valid votes
    AtLeast(usize),

    /// At least this percentage of eligible voters (0-100)
    Percentage(u8),
}

impl QuorumRule {
    /// Number of valid votes needed given the eligible-voter count
    pub fn required_votes(&self, eligible: usize) -> usize {
        let required = match self {
            QuorumRule::Majority => eligible / 2 + 1,
            QuorumRule::Unanimous => eligible,
            QuorumRule::AtLeast(n) => *n,
            QuorumRule::Percentage(p) => (eligible * usize::from(*p)).div_ceil(100),
        };
        required.max(1)
    }

    /// Check if `valid_votes` satisfies the rule for `eligible` voters
    pub fn is_met(&self, valid_votes: usize, eligible: usize) -> bool {
        valid_votes >= self.required_votes(eligible)
    }

    /// Get a human-readable description of this rule
    pub fn description(&self) -> String {
        match self {
            QuorumRule::Majority => "majority (more than half)".to_string(),
            QuorumRule::Unanimous => "unanimous (every eligible voter)".to_string(),
            QuorumRule::AtLeast(n) => format!("at least {} votes", n),
            QuorumRule::Percentage(p) => format!("at least {}% of eligible voters", p),
        }
    }

    fn config_key(&self) -> String {
        match self {
            QuorumRule::Majority => "majority".to_string(),
            QuorumRule::Unanimous => "unanimous".to_string(),
            QuorumRule::AtLeast(n) => format!("atleast:{}", n),
            QuorumRule::Percentage(p) => format!("{}%", p),
        }
    }
}

impl std::fmt::Display for QuorumRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::str::FromStr for QuorumRule {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| DomainError::InvalidQuorumRule(format!("{} ({})", s, why));
        match s.trim().to_lowercase().as_str() {
            "majority" => Ok(QuorumRule::Majority),
            "unanimous" => Ok(QuorumRule::Unanimous),
            s if s.starts_with("atleast:") || s.starts_with("at_least:") => {
                let n: usize = s
                    .split(':')
                    .nth(1)
                    .unwrap_or_default()
                    .parse()
                    .map_err(|_| invalid("invalid number for atleast"))?;
                Ok(QuorumRule::AtLeast(n))
            }
            s if s.starts_with("percentage:") || s.ends_with('%') => {
                let num_str = s.trim_start_matches("percentage:").trim_end_matches('%');
                let p: u8 = num_str.parse().map_err(|_| invalid("invalid percentage"))?;
                if p > 100 {
                    return Err(invalid("percentage above 100"));
                }
                Ok(QuorumRule::Percentage(p))
            }
            _ => Err(invalid(
                "valid: majority, unanimous, atleast:N, percentage:N or N%",
            )),
        }
    }
}

impl TryFrom<String> for QuorumRule {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<QuorumRule> for String {
    fn from(rule: QuorumRule) -> Self {
        rule.config_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_table() {
        let rule = QuorumRule::Majority;
        let table = [(0, 1), (1, 1), (2, 2), (3, 2), (4, 3), (5, 3)];
        for (eligible, required) in table {
            assert_eq!(rule.required_votes(eligible), required, "eligible={eligible}");
        }
    }

    #[test]
    fn test_empty_eligible_set_never_met_without_votes() {
        for rule in [
            QuorumRule::Majority,
            QuorumRule::Unanimous,
            QuorumRule::AtLeast(0),
            QuorumRule::Percentage(0),
        ] {
            assert!(!rule.is_met(0, 0), "{rule:?}");
        }
    }

    #[test]
    fn test_unanimous_rule() {
        let rule = QuorumRule::Unanimous;
        assert!(!rule.is_met(2, 3));
        assert!(rule.is_met(3, 3));
        assert!(rule.is_met(1, 1));
    }

    #[test]
    fn test_at_least_rule() {
        let rule = QuorumRule::AtLeast(2);
        assert!(!rule.is_met(1, 5));
        assert!(rule.is_met(2, 5));
    }

    #[test]
    fn test_percentage_rule() {
        let rule = QuorumRule::Percentage(75);
        // 4 eligible: 3 needed
        assert_eq!(rule.required_votes(4), 3);
        // 5 eligible: ceil(3.75) = 4
        assert_eq!(rule.required_votes(5), 4);
    }

    #[test]
    fn test_parse_rule() {
        assert_eq!("majority".parse::<QuorumRule>(), Ok(QuorumRule::Majority));
        assert_eq!("Unanimous".parse::<QuorumRule>(), Ok(QuorumRule::Unanimous));
        assert_eq!("atleast:2".parse::<QuorumRule>(), Ok(QuorumRule::AtLeast(2)));
        assert_eq!("at_least:3".parse::<QuorumRule>(), Ok(QuorumRule::AtLeast(3)));
        assert_eq!(
            "percentage:75".parse::<QuorumRule>(),
            Ok(QuorumRule::Percentage(75))
        );
        assert_eq!("80%".parse::<QuorumRule>(), Ok(QuorumRule::Percentage(80)));
        assert!("120%".parse::<QuorumRule>().is_err());
        assert!("atleast:".parse::<QuorumRule>().is_err());
        assert!("plurality".parse::<QuorumRule>().is_err());
    }

    #[test]
    fn test_serde_uses_config_strings() {
        let json = serde_json::to_string(&QuorumRule::AtLeast(2)).unwrap();
        assert_eq!(json, "\"atleast:2\"");
        let rule: QuorumRule = serde_json::from_str("\"60%\"").unwrap();
        assert_eq!(rule, QuorumRule::Percentage(60));
    }

    #[test]
    fn test_default() {
        assert_eq!(QuorumRule::default(), QuorumRule::Majority);
    }
}
