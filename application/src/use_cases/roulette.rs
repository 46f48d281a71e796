//! Roulette: mute one random occupant of the invoker's channel for a random
//! length of time.
//!
//! Both the index and the duration come from the [`RandomSource`] port. Each
//! invoker is rate-limited by a cooldown that starts as soon as an attempt
//! gets past the cooldown check, whether or not the spin succeeds.

use super::mute_ledger::{MuteError, MuteLedger, MuteOutcome};
use crate::config::RouletteConfig;
use crate::ports::event_sink::EventSink;
use crate::ports::presence::PresenceProvider;
use crate::ports::random_source::{NetworkError, RandomSource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};
use votemute_domain::{ModerationEvent, MuteDuration, SubjectId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouletteError {
    #[error("On cooldown, wait {remaining_secs} more second(s)")]
    OnCooldown { remaining_secs: u64 },

    #[error("{0} is not in a channel")]
    InvokerNotInChannel(SubjectId),

    #[error("No eligible members in the channel")]
    NoCandidates,

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Random source returned {value}, expected {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },

    #[error("Duration range {min}..={max} cannot be drawn from")]
    UnusableRange { min: u64, max: u64 },

    #[error(transparent)]
    Mute(#[from] MuteError),
}

/// A successful spin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouletteSpin {
    pub selected: SubjectId,
    pub duration: MuteDuration,
    pub outcome: MuteOutcome,
}

pub struct RouletteUseCase {
    presence: Arc<dyn PresenceProvider>,
    random: Arc<dyn RandomSource>,
    ledger: MuteLedger,
    events: Arc<dyn EventSink>,
    config: RouletteConfig,
    last_spin: Mutex<HashMap<SubjectId, Instant>>,
}

impl RouletteUseCase {
    pub fn new(
        presence: Arc<dyn PresenceProvider>,
        random: Arc<dyn RandomSource>,
        ledger: MuteLedger,
        events: Arc<dyn EventSink>,
        config: RouletteConfig,
    ) -> Self {
        Self {
            presence,
            random,
            ledger,
            events,
            config,
            last_spin: Mutex::new(HashMap::new()),
        }
    }

    pub async fn spin(&self, invoker: &SubjectId) -> Result<RouletteSpin, RouletteError> {
        self.check_cooldown(invoker)?;

        let channel = self
            .presence
            .current_channel(invoker)
            .await
            .ok_or_else(|| RouletteError::InvokerNotInChannel(invoker.clone()))?;

        // BTreeSet iteration gives a stable, sorted candidate order.
        let candidates: Vec<SubjectId> = self.presence.occupants(&channel).await.into_iter().collect();
        if candidates.is_empty() {
            return Err(RouletteError::NoCandidates);
        }

        let last = candidates.len() as i64 - 1;
        let index = self.draw(0, last).await?;
        let selected = candidates[index as usize].clone();

        let (min, max) = self.duration_range()?;
        let secs = self.draw(min, max).await?;
        let duration = MuteDuration::from_secs(secs as u64)
            .map_err(|_| RouletteError::OutOfRange { value: secs, min, max })?;

        debug!(invoker = %invoker, selected = %selected, secs, "Roulette drew");
        let outcome = self.ledger.add_mute(&selected, duration, &channel).await?;

        info!(invoker = %invoker, selected = %selected, duration_secs = duration.secs(), "Roulette spun");
        self.events.emit(ModerationEvent::RouletteSpun {
            invoker: invoker.clone(),
            selected: selected.clone(),
            duration_secs: duration.secs(),
        });

        Ok(RouletteSpin {
            selected,
            duration,
            outcome,
        })
    }

    /// Seconds until `invoker` may spin again, zero if allowed now
    pub fn cooldown_remaining(&self, invoker: &SubjectId) -> u64 {
        self.last_spin
            .lock()
            .get(invoker)
            .map(|at| self.config.cooldown.saturating_sub(at.elapsed()).as_secs())
            .unwrap_or(0)
    }

    fn check_cooldown(&self, invoker: &SubjectId) -> Result<(), RouletteError> {
        let now = Instant::now();
        let cooldown = self.config.cooldown;
        let mut last_spin = self.last_spin.lock();
        // Only invokers still cooling down are kept.
        last_spin.retain(|_, at| now.saturating_duration_since(*at) < cooldown);
        if let Some(at) = last_spin.get(invoker) {
            let elapsed = now.saturating_duration_since(*at);
            return Err(RouletteError::OnCooldown {
                remaining_secs: (cooldown - elapsed).as_secs(),
            });
        }
        last_spin.insert(invoker.clone(), now);
        Ok(())
    }

    fn duration_range(&self) -> Result<(i64, i64), RouletteError> {
        let (min, max) = (self.config.min_duration_secs, self.config.max_duration_secs);
        match (i64::try_from(min), i64::try_from(max)) {
            (Ok(lo), Ok(hi)) => Ok((lo, hi)),
            _ => Err(RouletteError::UnusableRange { min, max }),
        }
    }

    async fn draw(&self, min: i64, max: i64) -> Result<i64, RouletteError> {
        let value = self.random.request_random_int(min, max).await?;
        if value < min || value > max {
            return Err(RouletteError::OutOfRange { value, min, max });
        }
        Ok(value)
    }
}
