//! Structured moderation events
//!
//! The engine emits these instead of human-readable text. Formatting and
//! delivery belong to whichever sink consumes them.

use crate::core::ids::{ChannelId, ProposalId, SubjectId};
use serde::Serialize;

/// Why a proposal was dropped without resolving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    /// The target is no longer in any channel
    TargetUnreachable,
    /// Removed explicitly by a caller
    Withdrawn,
}

/// An event emitted by the mute ledger, vote tally or roulette feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModerationEvent {
    MuteApplied {
        subject: SubjectId,
        channel: ChannelId,
        duration_secs: u64,
    },
    MuteExtended {
        subject: SubjectId,
        channel: ChannelId,
        added_secs: u64,
        remaining_secs: u64,
    },
    MuteReleased {
        subject: SubjectId,
        channel: ChannelId,
        total_secs: u64,
        manual: bool,
    },
    ReleaseFailed {
        subject: SubjectId,
        error: String,
    },
    VoteStarted {
        proposal: ProposalId,
        target: SubjectId,
        channel: ChannelId,
        duration_secs: u64,
    },
    VoteCast {
        proposal: ProposalId,
        voter: SubjectId,
        valid_votes: usize,
        required: usize,
    },
    VoteResolved {
        proposal: ProposalId,
        target: SubjectId,
        duration_secs: u64,
    },
    ProposalExpired {
        proposal: ProposalId,
        target: SubjectId,
    },
    ProposalInvalidated {
        proposal: ProposalId,
        target: SubjectId,
        reason: InvalidationReason,
    },
    RouletteSpun {
        invoker: SubjectId,
        selected: SubjectId,
        duration_secs: u64,
    },
}

impl ModerationEvent {
    /// Event type identifier, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            ModerationEvent::MuteApplied { .. } => "mute_applied",
            ModerationEvent::MuteExtended { .. } => "mute_extended",
            ModerationEvent::MuteReleased { .. } => "mute_released",
            ModerationEvent::ReleaseFailed { .. } => "release_failed",
            ModerationEvent::VoteStarted { .. } => "vote_started",
            ModerationEvent::VoteCast { .. } => "vote_cast",
            ModerationEvent::VoteResolved { .. } => "vote_resolved",
            ModerationEvent::ProposalExpired { .. } => "proposal_expired",
            ModerationEvent::ProposalInvalidated { .. } => "proposal_invalidated",
            ModerationEvent::RouletteSpun { .. } => "roulette_spun",
        }
    }
}
