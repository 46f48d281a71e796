//! Identifier value objects
//!
//! Subjects and channels are owned by the platform; the engine only refers
//! to them by id. Proposal ids are allocated by the vote tally.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a channel participant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque identifier of a shared real-time channel
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of an open vote-mute proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(u64);

impl ProposalId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::str::FromStr for ProposalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_ordering_is_lexicographic() {
        let mut ids = vec![SubjectId::from("carol"), SubjectId::from("alice")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "alice");
    }

    #[test]
    fn test_proposal_id_parse_accepts_hash_prefix() {
        assert_eq!("#7".parse::<ProposalId>().unwrap(), ProposalId::new(7));
        assert_eq!("7".parse::<ProposalId>().unwrap(), ProposalId::new(7));
        assert!("seven".parse::<ProposalId>().is_err());
        assert_eq!(ProposalId::new(3).to_string(), "#3");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&SubjectId::from("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
        let json = serde_json::to_string(&ProposalId::new(4)).unwrap();
        assert_eq!(json, "4");
    }
}
