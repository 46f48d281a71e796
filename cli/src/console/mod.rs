//! Line-oriented moderation console
//!
//! Drives the engine against the in-memory providers: every line is one
//! [`Command`], and every command answers with a result line (or an
//! `error:` line). Errors never end the session.

mod command;
mod notify;

pub use command::{Command, HELP};
pub use notify::StdoutNotifier;

use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;
use votemute_application::{
    EngineConfig, EventSink, MuteError, MuteLedger, MuteOutcome, PresenceProvider, RandomSource,
    RouletteError, RouletteUseCase, TokioTimerScheduler, VoteError, VoteOutcome, VoteTally,
};
use votemute_domain::{ChannelId, ProposalId, SubjectId};
use votemute_infrastructure::{InMemoryActionProvider, InMemoryPresence};

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    Mute(#[from] MuteError),

    #[error(transparent)]
    Vote(#[from] VoteError),

    #[error(transparent)]
    Roulette(#[from] RouletteError),
}

pub struct Console {
    presence: Arc<InMemoryPresence>,
    actions: Arc<InMemoryActionProvider>,
    scheduler: Arc<TokioTimerScheduler>,
    ledger: MuteLedger,
    tally: VoteTally,
    roulette: RouletteUseCase,
}

impl Console {
    /// Wire the engine to fresh in-memory providers.
    pub fn new(random: Arc<dyn RandomSource>, events: Arc<dyn EventSink>, config: EngineConfig) -> Self {
        let presence = Arc::new(InMemoryPresence::new());
        let actions = Arc::new(InMemoryActionProvider::new());
        let scheduler = Arc::new(TokioTimerScheduler::new());

        let ledger = MuteLedger::new(
            actions.clone(),
            presence.clone(),
            scheduler.clone(),
            events.clone(),
        );
        let tally = VoteTally::new(
            presence.clone(),
            ledger.clone(),
            scheduler.clone(),
            events.clone(),
            config.vote,
        );
        let roulette = RouletteUseCase::new(
            presence.clone(),
            random,
            ledger.clone(),
            events,
            config.roulette,
        );

        Self {
            presence,
            actions,
            scheduler,
            ledger,
            tally,
            roulette,
        }
    }

    /// Read commands until end of input or `quit`, writing one result per command.
    pub async fn run<R, W>(&self, reader: R, out: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let command = match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(out, "error: {}", e)?;
                    continue;
                }
            };

            debug!(?command, "Executing console command");
            match self.execute(command).await {
                Ok(result) => writeln!(out, "{}", result)?,
                Err(e) => writeln!(out, "error: {}", e)?,
            }
            out.flush()?;
        }
        Ok(())
    }

    /// Stop every pending timer.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    pub async fn execute(&self, command: Command) -> Result<String, ConsoleError> {
        let result = match command {
            Command::Join { subject, channel, bot } => {
                let line = if bot {
                    format!("{} (bot) joined {}", subject, channel)
                } else {
                    format!("{} joined {}", subject, channel)
                };
                self.presence.join(subject, channel, bot);
                line
            }
            Command::Leave(subject) => match self.presence.leave(&subject) {
                Some(channel) => format!("{} left {}", subject, channel),
                None => format!("{} is not in a channel", subject),
            },
            Command::Mute(subject, duration) => {
                let channel = self
                    .channel_of(&subject)
                    .await
                    .ok_or_else(|| MuteError::TargetNotReachable(subject.clone()))?;
                let outcome = self.ledger.add_mute(&subject, duration, &channel).await?;
                describe_mute(&subject, outcome)
            }
            Command::Unmute(subject) => {
                let outcome = self.ledger.manual_release(&subject).await?;
                match outcome.muted_for {
                    Some(total) => format!("{} unmuted after {}s", subject, total.as_secs()),
                    None => format!("{} was not muted", subject),
                }
            }
            Command::VoteMute(target, duration) => {
                let channel = self
                    .channel_of(&target)
                    .await
                    .ok_or_else(|| VoteError::TargetNotReachable(target.clone()))?;
                let id = self.tally.open(&target, &channel, duration).await?;
                format!("vote {} opened: mute {} for {}", id, target, duration)
            }
            Command::Vote(id, voter) => {
                let outcome = self.tally.add_vote(id, &voter).await?;
                describe_vote(id, &voter, outcome)
            }
            Command::Unvote(id, voter) => {
                if self.tally.proposal(id).is_none() {
                    format!("no open vote {}", id)
                } else {
                    self.tally.remove_vote(id, &voter);
                    format!("{} withdrew from vote {}", voter, id)
                }
            }
            Command::Roulette(invoker) => {
                let spin = self.roulette.spin(&invoker).await?;
                format!("roulette picked {} for {}", spin.selected, spin.duration)
            }
            Command::Status(Some(subject)) => self.subject_status(&subject).await,
            Command::Status(None) => self.overall_status(),
            Command::Wait(duration) => {
                tokio::time::sleep(duration.as_duration()).await;
                format!("waited {}", duration)
            }
            Command::FailNextApply => {
                self.actions.fail_next_apply();
                "next mute will fail".to_string()
            }
            Command::FailNextRemove => {
                self.actions.fail_next_remove();
                "next unmute will fail".to_string()
            }
            Command::Help => HELP.to_string(),
            Command::Quit => "bye".to_string(),
        };
        Ok(result)
    }

    async fn channel_of(&self, subject: &SubjectId) -> Option<ChannelId> {
        self.presence.current_channel(subject).await
    }

    async fn subject_status(&self, subject: &SubjectId) -> String {
        let location = match self.channel_of(subject).await {
            Some(channel) => format!("in {}", channel),
            None => "not in a channel".to_string(),
        };
        match self.ledger.snapshot(subject) {
            Some(mute) => format!(
                "{}: {}, muted, {}s remaining of {}s",
                subject,
                location,
                mute.remaining().as_secs(),
                mute.total().as_secs()
            ),
            None => format!("{}: {}, not muted", subject, location),
        }
    }

    fn overall_status(&self) -> String {
        let channels: Vec<String> = self
            .presence
            .channels()
            .into_iter()
            .map(|(channel, members)| {
                let members: Vec<&str> = members.iter().map(SubjectId::as_str).collect();
                format!("{}[{}]", channel, members.join(","))
            })
            .collect();
        let mutes: Vec<String> = self
            .ledger
            .active()
            .into_iter()
            .map(|m| format!("{}({}s)", m.subject, m.remaining().as_secs()))
            .collect();
        let votes: Vec<String> = self
            .tally
            .open_ids()
            .into_iter()
            .filter_map(|id| self.tally.proposal(id))
            .map(|p| format!("{} {}({} votes)", p.id, p.target, p.votes.len()))
            .collect();

        format!(
            "channels: {} | muted: {} | votes: {}",
            or_none(&channels),
            or_none(&mutes),
            or_none(&votes)
        )
    }
}

fn or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(" ")
    }
}

fn describe_mute(subject: &SubjectId, outcome: MuteOutcome) -> String {
    match outcome {
        MuteOutcome::Applied { duration } => format!("{} muted for {}", subject, duration),
        MuteOutcome::Extended { added, remaining } => format!(
            "{}'s mute extended by {}, {}s remaining",
            subject,
            added,
            remaining.as_secs()
        ),
    }
}

fn describe_vote(id: ProposalId, voter: &SubjectId, outcome: VoteOutcome) -> String {
    match outcome {
        VoteOutcome::UnknownProposal => format!("no open vote {}", id),
        VoteOutcome::TargetUnreachable => {
            format!("vote {} dropped, its target is no longer in a channel", id)
        }
        VoteOutcome::VoterNotInChannel => {
            format!("{} is not in the target's channel, vote ignored", voter)
        }
        VoteOutcome::Counted(check) => format!(
            "vote {}: {}/{} ({} more needed)",
            id,
            check.valid_votes,
            check.required,
            check.missing()
        ),
        VoteOutcome::Resolved { check, outcome } => {
            let verb = if outcome.is_extension() { "extended" } else { "applied" };
            format!(
                "vote {} passed with {}/{}, mute {}",
                id, check.valid_votes, check.eligible, verb
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use votemute_application::{NetworkError, NoEvents};

    /// Answers with scripted values, then with the lower bound.
    #[derive(Default)]
    struct ScriptedRandom(Mutex<VecDeque<i64>>);

    #[async_trait]
    impl RandomSource for ScriptedRandom {
        async fn request_random_int(&self, min: i64, _max: i64) -> Result<i64, NetworkError> {
            Ok(self.0.lock().pop_front().unwrap_or(min))
        }
    }

    fn console() -> Console {
        Console::new(
            Arc::new(ScriptedRandom::default()),
            Arc::new(NoEvents),
            EngineConfig::default(),
        )
    }

    async fn run_script(console: &Console, script: &str) -> Vec<String> {
        let mut out = Vec::new();
        console.run(script.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_vote_scenario() {
        let console = console();
        let output = run_script(
            &console,
            "\
# three members can vote on bob
join bob voice
join alice voice
join carol voice
join dave voice
votemute bob 30s
vote #1 alice
vote #1 carol
status bob
",
        )
        .await;

        assert_eq!(
            output,
            vec![
                "bob joined voice",
                "alice joined voice",
                "carol joined voice",
                "dave joined voice",
                "vote #1 opened: mute bob for 30s",
                "vote #1: 1/2 (1 more needed)",
                "vote #1 passed with 2/3, mute applied",
                "bob: in voice, muted, 30s remaining of 30s",
            ]
        );
        assert!(console.actions.is_silenced(&SubjectId::from("bob")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mute_stacks_and_expires() {
        let console = console();
        let output = run_script(
            &console,
            "\
join bob voice
mute bob 20s
wait 5s
mute bob 15s
status bob
wait 31s
status bob
",
        )
        .await;

        assert_eq!(
            output,
            vec![
                "bob joined voice",
                "bob muted for 20s",
                "waited 5s",
                "bob's mute extended by 15s, 30s remaining",
                "bob: in voice, muted, 30s remaining of 35s",
                "waited 31s",
                "bob: in voice, not muted",
            ]
        );
        assert!(!console.actions.is_silenced(&SubjectId::from("bob")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_the_console() {
        let console = console();
        let output = run_script(
            &console,
            "\
mute ghost 10s
dance
join bob voice
fail-next-apply
mute bob 10s
status bob
unmute bob
quit
join never voice
",
        )
        .await;

        assert_eq!(output.len(), 7);
        assert_eq!(output[0], "error: ghost is not in a channel");
        assert!(output[1].starts_with("error: unknown command 'dance'"));
        assert_eq!(output[3], "next mute will fail");
        assert!(output[4].starts_with("error: "));
        assert_eq!(output[5], "bob: in voice, not muted");
        assert_eq!(output[6], "bob was not muted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_roulette_and_overall_status() {
        let console = console();
        let output = run_script(
            &console,
            "\
join alice voice
join bob voice
join helper voice bot
roulette alice
roulette alice
status
",
        )
        .await;

        // Scripted source falls back to the lower bound: index 0, 10s.
        assert_eq!(output[3], "roulette picked alice for 10s");
        assert!(output[4].starts_with("error: On cooldown"));
        assert_eq!(
            output[5],
            "channels: voice[alice,bob,helper] | muted: alice(10s) | votes: none"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unvote_and_expiry() {
        let console = console();
        let output = run_script(
            &console,
            "\
join bob voice
join alice voice
join carol voice
votemute bob 1m
unvote #1 alice
unvote #9 alice
wait 61s
vote #1 alice
",
        )
        .await;

        assert_eq!(output[4], "alice withdrew from vote #1");
        assert_eq!(output[5], "no open vote #9");
        assert_eq!(output[7], "no open vote #1");
    }
}
