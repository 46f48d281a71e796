//! Vote tally
//!
//! Owns the open vote-mute proposals. Votes are stored raw; eligibility is
//! recomputed from live presence on every accepted vote, and a proposal that
//! reaches quorum hands its mute to the [`MuteLedger`] exactly once.
//!
//! Presence and ledger calls are made outside the per-proposal lock. A
//! proposal that resolves or is invalidated while another call is between
//! those steps is marked closed, and late callers observe it as unknown.

use super::mute_ledger::{MuteError, MuteLedger, MuteOutcome};
use crate::config::VoteConfig;
use crate::ports::event_sink::EventSink;
use crate::ports::presence::PresenceProvider;
use crate::timer::{TimerHandle, TimerScheduler};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use votemute_domain::quorum::eligible_voters;
use votemute_domain::{
    ChannelId, InvalidationReason, ModerationEvent, MuteDuration, ProposalId, QuorumCheck,
    SubjectId,
};

/// Errors returned by tally operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("{0} is not in a channel")]
    TargetNotReachable(SubjectId),

    #[error("Vote passed but the mute failed: {0}")]
    Mute(#[from] MuteError),
}

/// Result of [`VoteTally::add_vote`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// No such open proposal
    UnknownProposal,
    /// The target left every channel; the proposal was removed
    TargetUnreachable,
    /// The voter is not in the target's channel; nothing changed
    VoterNotInChannel,
    /// Vote recorded, quorum not yet reached
    Counted(QuorumCheck),
    /// Quorum reached; the target was muted and the proposal removed
    Resolved {
        check: QuorumCheck,
        outcome: MuteOutcome,
    },
}

impl VoteOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, VoteOutcome::Resolved { .. })
    }
}

/// Read-only view of an open proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalSnapshot {
    pub id: ProposalId,
    pub target: SubjectId,
    pub channel: ChannelId,
    pub duration: MuteDuration,
    pub votes: BTreeSet<SubjectId>,
    pub created_at: Instant,
}

struct VoteProposal {
    target: SubjectId,
    channel: ChannelId,
    duration: MuteDuration,
    votes: BTreeSet<SubjectId>,
    created_at: Instant,
    lifetime: Option<TimerHandle>,
    closed: bool,
}

impl VoteProposal {
    /// Mark closed and stop the lifetime timer. Returns false if already closed.
    fn close(&mut self, scheduler: &dyn TimerScheduler) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        if let Some(timer) = self.lifetime.take() {
            scheduler.cancel(&timer);
        }
        true
    }
}

struct TallyInner {
    presence: Arc<dyn PresenceProvider>,
    ledger: MuteLedger,
    scheduler: Arc<dyn TimerScheduler>,
    events: Arc<dyn EventSink>,
    config: VoteConfig,
    next_id: AtomicU64,
    proposals: RwLock<HashMap<ProposalId, Arc<Mutex<VoteProposal>>>>,
}

impl TallyInner {
    fn get(&self, id: ProposalId) -> Option<Arc<Mutex<VoteProposal>>> {
        self.proposals.read().get(&id).cloned()
    }

    /// Close and unlink a proposal. Returns its target if this call closed it.
    fn remove(&self, id: ProposalId) -> Option<SubjectId> {
        let proposal = self.proposals.write().remove(&id)?;
        let mut proposal = proposal.lock();
        proposal
            .close(self.scheduler.as_ref())
            .then(|| proposal.target.clone())
    }

    fn expire(&self, id: ProposalId) {
        if let Some(target) = self.remove(id) {
            info!(proposal = %id, target = %target, "Proposal expired");
            self.events
                .emit(ModerationEvent::ProposalExpired { proposal: id, target });
        }
    }
}

/// Open vote-mute proposals.
#[derive(Clone)]
pub struct VoteTally {
    inner: Arc<TallyInner>,
}

impl VoteTally {
    pub fn new(
        presence: Arc<dyn PresenceProvider>,
        ledger: MuteLedger,
        scheduler: Arc<dyn TimerScheduler>,
        events: Arc<dyn EventSink>,
        config: VoteConfig,
    ) -> Self {
        Self {
            inner: Arc::new(TallyInner {
                presence,
                ledger,
                scheduler,
                events,
                config,
                next_id: AtomicU64::new(1),
                proposals: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Open a proposal to mute `target` for `duration`.
    ///
    /// `channel` is where the proposal was raised and where the eventual mute
    /// is reported. The proposal invalidates itself after the configured
    /// lifetime unless it resolves first.
    pub async fn open(
        &self,
        target: &SubjectId,
        channel: &ChannelId,
        duration: MuteDuration,
    ) -> Result<ProposalId, VoteError> {
        if self.inner.presence.current_channel(target).await.is_none() {
            return Err(VoteError::TargetNotReachable(target.clone()));
        }

        let id = ProposalId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let tally = Arc::downgrade(&self.inner);
        let lifetime = self.inner.scheduler.schedule(
            self.inner.config.lifetime,
            Box::pin(async move {
                if let Some(tally) = tally.upgrade() {
                    tally.expire(id);
                }
            }),
        );

        let proposal = VoteProposal {
            target: target.clone(),
            channel: channel.clone(),
            duration,
            votes: BTreeSet::new(),
            created_at: Instant::now(),
            lifetime: Some(lifetime),
            closed: false,
        };
        self.inner
            .proposals
            .write()
            .insert(id, Arc::new(Mutex::new(proposal)));

        info!(proposal = %id, target = %target, duration_secs = duration.secs(), "Vote started");
        self.inner.events.emit(ModerationEvent::VoteStarted {
            proposal: id,
            target: target.clone(),
            channel: channel.clone(),
            duration_secs: duration.secs(),
        });
        Ok(id)
    }

    /// Record a vote and resolve the proposal if quorum is reached.
    pub async fn add_vote(&self, id: ProposalId, voter: &SubjectId) -> Result<VoteOutcome, VoteError> {
        let Some(proposal) = self.inner.get(id) else {
            return Ok(VoteOutcome::UnknownProposal);
        };
        let target = {
            let proposal = proposal.lock();
            if proposal.closed {
                return Ok(VoteOutcome::UnknownProposal);
            }
            proposal.target.clone()
        };

        let Some(target_channel) = self.inner.presence.current_channel(&target).await else {
            if self.inner.remove(id).is_some() {
                info!(proposal = %id, target = %target, "Target left every channel, dropping proposal");
                self.inner.events.emit(ModerationEvent::ProposalInvalidated {
                    proposal: id,
                    target,
                    reason: InvalidationReason::TargetUnreachable,
                });
            }
            return Ok(VoteOutcome::TargetUnreachable);
        };

        if self.inner.presence.current_channel(voter).await.as_ref() != Some(&target_channel) {
            debug!(proposal = %id, voter = %voter, "Vote rejected, voter not in target's channel");
            return Ok(VoteOutcome::VoterNotInChannel);
        }

        let occupants = self.inner.presence.occupants(&target_channel).await;
        let eligible = eligible_voters(&occupants, &target);

        let (check, resolution) = {
            let mut proposal = proposal.lock();
            if proposal.closed {
                return Ok(VoteOutcome::UnknownProposal);
            }
            proposal.votes.insert(voter.clone());
            let check = QuorumCheck::evaluate(&proposal.votes, &eligible, self.inner.config.rule);
            let resolution = if check.is_reached() {
                proposal.close(self.inner.scheduler.as_ref());
                Some((proposal.duration, proposal.channel.clone()))
            } else {
                None
            };
            (check, resolution)
        };

        let Some((duration, channel)) = resolution else {
            debug!(
                proposal = %id,
                voter = %voter,
                valid_votes = check.valid_votes,
                required = check.required,
                "Vote counted"
            );
            self.inner.events.emit(ModerationEvent::VoteCast {
                proposal: id,
                voter: voter.clone(),
                valid_votes: check.valid_votes,
                required: check.required,
            });
            return Ok(VoteOutcome::Counted(check));
        };

        self.inner.proposals.write().remove(&id);
        info!(
            proposal = %id,
            target = %target,
            valid_votes = check.valid_votes,
            eligible = check.eligible,
            "Vote resolved"
        );

        match self.inner.ledger.add_mute(&target, duration, &channel).await {
            Ok(outcome) => {
                self.inner.events.emit(ModerationEvent::VoteResolved {
                    proposal: id,
                    target,
                    duration_secs: duration.secs(),
                });
                Ok(VoteOutcome::Resolved { check, outcome })
            }
            Err(e) => {
                warn!(proposal = %id, error = %e, "Resolved vote could not mute target");
                Err(e.into())
            }
        }
    }

    /// Withdraw a vote. Never resolves the proposal.
    pub fn remove_vote(&self, id: ProposalId, voter: &SubjectId) {
        if let Some(proposal) = self.inner.get(id) {
            proposal.lock().votes.remove(voter);
        }
    }

    /// Drop a proposal without muting anyone. Returns false if it was not open.
    pub fn invalidate(&self, id: ProposalId) -> bool {
        match self.inner.remove(id) {
            Some(target) => {
                info!(proposal = %id, "Proposal invalidated");
                self.inner.events.emit(ModerationEvent::ProposalInvalidated {
                    proposal: id,
                    target,
                    reason: InvalidationReason::Withdrawn,
                });
                true
            }
            None => false,
        }
    }

    pub fn proposal(&self, id: ProposalId) -> Option<ProposalSnapshot> {
        let proposal = self.inner.get(id)?;
        let proposal = proposal.lock();
        (!proposal.closed).then(|| ProposalSnapshot {
            id,
            target: proposal.target.clone(),
            channel: proposal.channel.clone(),
            duration: proposal.duration,
            votes: proposal.votes.clone(),
            created_at: proposal.created_at,
        })
    }

    pub fn open_count(&self) -> usize {
        self.inner.proposals.read().len()
    }

    /// Ids of every open proposal, in creation order
    pub fn open_ids(&self) -> Vec<ProposalId> {
        let mut ids: Vec<ProposalId> = self.inner.proposals.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::super::mute_ledger::test_support::*;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    struct Fixture {
        tally: VoteTally,
        ledger: MuteLedger,
        actions: Arc<MockActionProvider>,
        presence: Arc<MockPresence>,
        events: Arc<RecordingEvents>,
    }

    fn fixture() -> Fixture {
        let actions = Arc::new(MockActionProvider::default());
        let presence = Arc::new(MockPresence::default());
        let events = Arc::new(RecordingEvents::default());
        let scheduler: Arc<dyn TimerScheduler> = Arc::new(CountingScheduler::default());
        let ledger = MuteLedger::new(
            actions.clone(),
            presence.clone(),
            scheduler.clone(),
            events.clone(),
        );
        let tally = VoteTally::new(
            presence.clone(),
            ledger.clone(),
            scheduler,
            events.clone(),
            VoteConfig::default(),
        );
        Fixture {
            tally,
            ledger,
            actions,
            presence,
            events,
        }
    }

    fn id(s: &str) -> SubjectId {
        SubjectId::from(s)
    }

    fn secs(n: u64) -> MuteDuration {
        MuteDuration::from_secs(n).unwrap()
    }

    async fn open_on_target(f: &Fixture) -> ProposalId {
        f.tally
            .open(&id("target"), &ChannelId::from("text"), secs(30))
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_majority_of_three_resolves_on_second_vote() {
        let f = fixture();
        for who in ["target", "x", "y", "z"] {
            f.presence.join(who, "voice");
        }
        let proposal = open_on_target(&f).await;

        let first = f.tally.add_vote(proposal, &id("x")).await.unwrap();
        assert_eq!(
            first,
            VoteOutcome::Counted(QuorumCheck {
                eligible: 3,
                valid_votes: 1,
                required: 2,
            })
        );
        assert_eq!(f.actions.apply_count(), 0);

        let second = f.tally.add_vote(proposal, &id("y")).await.unwrap();
        assert!(second.is_resolved());
        assert_eq!(f.actions.apply_count(), 1);
        assert!(f.ledger.is_restricted(&id("target")));
        assert!(f.tally.proposal(proposal).is_none());
        assert_eq!(f.tally.open_count(), 0);

        // Late votes see nothing.
        let late = f.tally.add_vote(proposal, &id("z")).await.unwrap();
        assert_eq!(late, VoteOutcome::UnknownProposal);
        assert_eq!(f.actions.apply_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_voter_who_left_stops_counting() {
        let f = fixture();
        for who in ["target", "x", "y", "z", "w"] {
            f.presence.join(who, "voice");
        }
        let proposal = open_on_target(&f).await;

        // 4 eligible, 3 needed
        f.tally.add_vote(proposal, &id("x")).await.unwrap();
        f.presence.leave("x");

        // 3 eligible, 2 needed; x's stale vote does not count
        let outcome = f.tally.add_vote(proposal, &id("y")).await.unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Counted(QuorumCheck {
                eligible: 3,
                valid_votes: 1,
                required: 2,
            })
        );
        // The stale vote stays in the raw set.
        let snapshot = f.tally.proposal(proposal).unwrap();
        assert!(snapshot.votes.contains(&id("x")));

        let outcome = f.tally.add_vote(proposal, &id("z")).await.unwrap();
        assert!(outcome.is_resolved());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_votes_are_idempotent() {
        let f = fixture();
        for who in ["target", "x", "y", "z"] {
            f.presence.join(who, "voice");
        }
        let proposal = open_on_target(&f).await;

        f.tally.add_vote(proposal, &id("x")).await.unwrap();
        let again = f.tally.add_vote(proposal, &id("x")).await.unwrap();

        assert!(!again.is_resolved());
        assert_eq!(f.tally.proposal(proposal).unwrap().votes.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_vote() {
        let f = fixture();
        for who in ["target", "x", "y", "z"] {
            f.presence.join(who, "voice");
        }
        let proposal = open_on_target(&f).await;

        f.tally.add_vote(proposal, &id("x")).await.unwrap();
        f.tally.remove_vote(proposal, &id("never-voted"));
        assert_eq!(f.tally.proposal(proposal).unwrap().votes.len(), 1);

        f.tally.remove_vote(proposal, &id("x"));
        assert!(f.tally.proposal(proposal).unwrap().votes.is_empty());

        // x withdrew, so y alone is not enough
        let outcome = f.tally.add_vote(proposal, &id("y")).await.unwrap();
        assert!(!outcome.is_resolved());

        // Unknown proposal is a no-op
        f.tally.remove_vote(ProposalId::new(999), &id("x"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_voter_outside_channel_is_rejected() {
        let f = fixture();
        for who in ["target", "x", "y"] {
            f.presence.join(who, "voice");
        }
        f.presence.join("outsider", "other");
        let proposal = open_on_target(&f).await;

        let outcome = f.tally.add_vote(proposal, &id("outsider")).await.unwrap();
        assert_eq!(outcome, VoteOutcome::VoterNotInChannel);

        let nowhere = f.tally.add_vote(proposal, &id("ghost")).await.unwrap();
        assert_eq!(nowhere, VoteOutcome::VoterNotInChannel);
        assert!(f.tally.proposal(proposal).unwrap().votes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_leaving_invalidates_proposal() {
        let f = fixture();
        for who in ["target", "x"] {
            f.presence.join(who, "voice");
        }
        let proposal = open_on_target(&f).await;
        f.presence.leave("target");

        let outcome = f.tally.add_vote(proposal, &id("x")).await.unwrap();

        assert_eq!(outcome, VoteOutcome::TargetUnreachable);
        assert!(f.tally.proposal(proposal).is_none());
        assert_eq!(f.actions.apply_count(), 0);
        assert_eq!(
            f.events.types(),
            vec!["vote_started", "proposal_invalidated"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_requires_target_in_channel() {
        let f = fixture();
        let result = f
            .tally
            .open(&id("target"), &ChannelId::from("text"), secs(30))
            .await;
        assert_eq!(result, Err(VoteError::TargetNotReachable(id("target"))));
        assert_eq!(f.tally.open_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_alone_never_resolves() {
        let f = fixture();
        f.presence.join("target", "voice");
        let proposal = open_on_target(&f).await;

        // The target votes for itself; it is never eligible.
        let outcome = f.tally.add_vote(proposal, &id("target")).await.unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Counted(QuorumCheck {
                eligible: 0,
                valid_votes: 0,
                required: 1,
            })
        );
        assert!(f.tally.proposal(proposal).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bots_are_not_eligible() {
        let f = fixture();
        f.presence.join("target", "voice");
        f.presence.join("x", "voice");
        f.presence.join_bot("bot", "voice");
        let proposal = open_on_target(&f).await;

        // Only x is eligible: quorum 1.
        let outcome = f.tally.add_vote(proposal, &id("x")).await.unwrap();
        assert!(outcome.is_resolved());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_stacks_onto_active_mute() {
        let f = fixture();
        for who in ["target", "x"] {
            f.presence.join(who, "voice");
        }
        f.ledger
            .add_mute(&id("target"), secs(30), &ChannelId::from("text"))
            .await
            .unwrap();
        let original_end = f.ledger.snapshot(&id("target")).unwrap().ends_at;
        tokio::time::sleep(Duration::from_secs(10)).await;

        let proposal = f
            .tally
            .open(&id("target"), &ChannelId::from("text"), secs(15))
            .await
            .unwrap();
        let outcome = f.tally.add_vote(proposal, &id("x")).await.unwrap();

        assert!(matches!(
            outcome,
            VoteOutcome::Resolved {
                outcome: MuteOutcome::Extended { .. },
                ..
            }
        ));
        assert_eq!(
            f.ledger.snapshot(&id("target")).unwrap().ends_at,
            original_end + Duration::from_secs(15)
        );
        assert_eq!(f.actions.apply_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_mute_still_closes_proposal() {
        let f = fixture();
        for who in ["target", "x"] {
            f.presence.join(who, "voice");
        }
        let proposal = open_on_target(&f).await;
        f.actions.fail_apply.store(true, Ordering::SeqCst);

        let result = f.tally.add_vote(proposal, &id("x")).await;

        assert!(matches!(result, Err(VoteError::Mute(MuteError::Provider(_)))));
        assert!(f.tally.proposal(proposal).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_proposal_expires_after_lifetime() {
        let f = fixture();
        for who in ["target", "x", "y", "z"] {
            f.presence.join(who, "voice");
        }
        let proposal = open_on_target(&f).await;
        f.tally.add_vote(proposal, &id("x")).await.unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(f.tally.proposal(proposal).is_none());
        assert_eq!(
            f.tally.add_vote(proposal, &id("y")).await.unwrap(),
            VoteOutcome::UnknownProposal
        );
        assert_eq!(
            f.events.types(),
            vec!["vote_started", "vote_cast", "proposal_expired"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_has_no_ledger_side_effects() {
        let f = fixture();
        for who in ["target", "x"] {
            f.presence.join(who, "voice");
        }
        let proposal = open_on_target(&f).await;

        assert!(f.tally.invalidate(proposal));
        assert!(!f.tally.invalidate(proposal));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(f.actions.apply_count(), 0);
        assert_eq!(
            f.events.types(),
            vec!["vote_started", "proposal_invalidated"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_proposal_vote_is_noop() {
        let f = fixture();
        let outcome = f.tally.add_vote(ProposalId::new(42), &id("x")).await.unwrap();
        assert_eq!(outcome, VoteOutcome::UnknownProposal);
        assert!(!outcome.is_resolved());
    }
}
