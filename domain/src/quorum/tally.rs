//! Quorum evaluation over raw votes and a live eligible set

use super::rule::QuorumRule;
use crate::core::ids::SubjectId;
use serde::Serialize;
use std::collections::BTreeSet;

/// Result of evaluating a proposal's votes against the current eligible set
///
/// Raw votes may contain voters who have since left the channel; only the
/// intersection with `eligible` counts toward `valid_votes`.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use votemute_domain::{QuorumCheck, QuorumRule, SubjectId};
///
/// let votes: BTreeSet<SubjectId> = ["x", "gone"].into_iter().map(SubjectId::from).collect();
/// let eligible: BTreeSet<SubjectId> = ["x", "y", "z"].into_iter().map(SubjectId::from).collect();
///
/// let check = QuorumCheck::evaluate(&votes, &eligible, QuorumRule::Majority);
/// assert_eq!(check.valid_votes, 1);
/// assert_eq!(check.required, 2);
/// assert!(!check.is_reached());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuorumCheck {
    /// Size of the live eligible set
    pub eligible: usize,
    /// Votes cast by currently eligible voters
    pub valid_votes: usize,
    /// Votes needed under the rule
    pub required: usize,
}

impl QuorumCheck {
    pub fn evaluate(
        votes: &BTreeSet<SubjectId>,
        eligible: &BTreeSet<SubjectId>,
        rule: QuorumRule,
    ) -> Self {
        let valid_votes = votes.intersection(eligible).count();
        Self {
            eligible: eligible.len(),
            valid_votes,
            required: rule.required_votes(eligible.len()),
        }
    }

    pub fn is_reached(&self) -> bool {
        self.valid_votes >= self.required
    }

    /// Votes still missing before the proposal resolves
    pub fn missing(&self) -> usize {
        self.required.saturating_sub(self.valid_votes)
    }
}

/// Derive the eligible voter set: channel occupants minus the target.
///
/// Occupant lists are expected to exclude automated participants already.
pub fn eligible_voters(occupants: &BTreeSet<SubjectId>, target: &SubjectId) -> BTreeSet<SubjectId> {
    occupants.iter().filter(|s| *s != target).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<SubjectId> {
        ids.iter().map(|s| SubjectId::from(*s)).collect()
    }

    #[test]
    fn test_eligible_excludes_target() {
        let eligible = eligible_voters(&set(&["t", "a", "b"]), &SubjectId::from("t"));
        assert_eq!(eligible, set(&["a", "b"]));
    }

    #[test]
    fn test_stale_votes_do_not_count() {
        let check = QuorumCheck::evaluate(&set(&["x", "y"]), &set(&["y", "z"]), QuorumRule::Majority);
        assert_eq!(check.valid_votes, 1);
        assert_eq!(check.required, 2);
        assert_eq!(check.missing(), 1);
        assert!(!check.is_reached());
    }

    #[test]
    fn test_reached_with_majority() {
        let check = QuorumCheck::evaluate(&set(&["a", "b"]), &set(&["a", "b", "c"]), QuorumRule::Majority);
        assert!(check.is_reached());
        assert_eq!(check.missing(), 0);
    }

    #[test]
    fn test_empty_eligible_set_starves() {
        let check = QuorumCheck::evaluate(&set(&["a"]), &set(&[]), QuorumRule::Majority);
        assert_eq!(check.required, 1);
        assert_eq!(check.valid_votes, 0);
        assert!(!check.is_reached());
    }
}
