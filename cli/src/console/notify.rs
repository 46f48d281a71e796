//! Human-readable notifications for moderation events

use votemute_application::EventSink;
use votemute_domain::{InvalidationReason, ModerationEvent};

/// Render an event the way a chat channel would announce it.
pub fn format_event(event: &ModerationEvent) -> String {
    match event {
        ModerationEvent::MuteApplied {
            subject,
            channel,
            duration_secs,
        } => format!("{} has been muted for {}s (in {})", subject, duration_secs, channel),
        ModerationEvent::MuteExtended {
            subject,
            added_secs,
            remaining_secs,
            ..
        } => format!(
            "{}'s mute was extended by {}s, {}s remaining",
            subject, added_secs, remaining_secs
        ),
        ModerationEvent::MuteReleased {
            subject,
            total_secs,
            manual: false,
            ..
        } => format!("{} has been unmuted after {}s", subject, total_secs),
        ModerationEvent::MuteReleased {
            subject,
            total_secs,
            manual: true,
            ..
        } => format!("{} was unmuted early after {}s", subject, total_secs),
        ModerationEvent::ReleaseFailed { subject, error } => {
            format!("could not unmute {}: {}", subject, error)
        }
        ModerationEvent::VoteStarted {
            proposal,
            target,
            duration_secs,
            ..
        } => format!(
            "vote {} started: mute {} for {}s? vote with `vote {} <name>`",
            proposal, target, duration_secs, proposal
        ),
        ModerationEvent::VoteCast {
            proposal,
            voter,
            valid_votes,
            required,
        } => format!(
            "{} voted on {} ({}/{})",
            voter, proposal, valid_votes, required
        ),
        ModerationEvent::VoteResolved {
            proposal,
            target,
            duration_secs,
        } => format!(
            "vote {} passed: {} muted for {}s",
            proposal, target, duration_secs
        ),
        ModerationEvent::ProposalExpired { proposal, target } => {
            format!("vote {} to mute {} expired", proposal, target)
        }
        ModerationEvent::ProposalInvalidated {
            proposal,
            target,
            reason: InvalidationReason::TargetUnreachable,
        } => format!(
            "vote {} cancelled: {} is no longer in a channel",
            proposal, target
        ),
        ModerationEvent::ProposalInvalidated {
            proposal, target, ..
        } => format!("vote {} to mute {} was withdrawn", proposal, target),
        ModerationEvent::RouletteSpun {
            invoker,
            selected,
            duration_secs,
        } => format!(
            "roulette by {}: {} has been muted for {}s!",
            invoker, selected, duration_secs
        ),
    }
}

/// Prints each event to stdout as a `* ` prefixed line.
pub struct StdoutNotifier;

impl EventSink for StdoutNotifier {
    fn emit(&self, event: ModerationEvent) {
        println!("* {}", format_event(&event));
    }
}
