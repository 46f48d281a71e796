//! Mute ledger
//!
//! Owns one record per restricted subject, stacks durations onto active
//! restrictions and lifts them when their time elapses.
//!
//! # Per-subject state machine
//!
//! ```text
//!                 add_mute (fresh)                 apply ok
//! Unrestricted ───────────────────▶ Applying ─────────────────▶ Restricted ◀─┐
//!      ▲                               │ apply failed              │    │     │ add_mute
//!      └───────────────────────────────┘                           │    └─────┘ (stack)
//!      ▲                                                           │
//!      └──────────────── Releasing ◀───────────────────────────────┘
//!                                      expiry / manual_release
//! ```
//!
//! `Applying` and `Releasing` exist so that provider calls happen outside
//! the per-subject lock. Any operation that finds a subject in one of them
//! waits for the transition to settle, without holding the lock, and then
//! re-evaluates.
//! A caller that abandons its future mid-call leaves the subject
//! `Unrestricted`.
//!
//! Each record carries the timer for its current `end`. Expiry callbacks
//! re-read the record under the lock and do nothing unless `end` still
//! matches the instant they were scheduled for.

use crate::ports::action_provider::{ActionProvider, ProviderError};
use crate::ports::event_sink::EventSink;
use crate::ports::presence::PresenceProvider;
use crate::timer::{TimerHandle, TimerScheduler};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use votemute_domain::{ChannelId, ModerationEvent, MuteDuration, SubjectId};

/// Furthest a restriction may end from the moment it is set or extended.
pub const MAX_MUTE_WINDOW: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// `from + added`, never later than [`MAX_MUTE_WINDOW`] past `now`.
fn capped_end(from: Instant, added: Duration, now: Instant) -> Instant {
    let cap = now.checked_add(MAX_MUTE_WINDOW);
    match from.checked_add(added) {
        Some(end) => cap.map_or(end, |cap| end.min(cap)),
        None => cap.unwrap_or(from),
    }
}

/// Errors returned by ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MuteError {
    #[error("{0} is not in a channel")]
    TargetNotReachable(SubjectId),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Result of a successful [`MuteLedger::add_mute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteOutcome {
    /// A fresh restriction was applied on the platform
    Applied { duration: MuteDuration },
    /// An active restriction was extended; the platform was not called
    Extended {
        added: MuteDuration,
        remaining: Duration,
    },
}

impl MuteOutcome {
    pub fn is_extension(&self) -> bool {
        matches!(self, MuteOutcome::Extended { .. })
    }
}

/// Result of a successful [`MuteLedger::manual_release`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Whether the ledger held a record for the subject
    pub was_restricted: bool,
    /// How long the cleared restriction had lasted
    pub muted_for: Option<Duration>,
}

/// Read-only view of an active restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteSnapshot {
    pub subject: SubjectId,
    pub channel: ChannelId,
    pub started_at: Instant,
    pub ends_at: Instant,
}

impl MuteSnapshot {
    pub fn remaining(&self) -> Duration {
        self.ends_at.saturating_duration_since(Instant::now())
    }

    pub fn total(&self) -> Duration {
        self.ends_at.saturating_duration_since(self.started_at)
    }
}

struct MuteRecord {
    channel: ChannelId,
    start: Instant,
    end: Instant,
    timer: TimerHandle,
}

enum SlotState {
    Unrestricted,
    Applying,
    Releasing,
    Restricted(MuteRecord),
}

struct SubjectSlot {
    state: Mutex<SlotState>,
    settled: Notify,
}

impl SubjectSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Unrestricted),
            settled: Notify::new(),
        }
    }

    fn settle(&self, state: SlotState) {
        *self.state.lock() = state;
        self.settled.notify_waiters();
    }
}

/// Marks a slot as owned by an in-flight provider call.
///
/// If the owning future is dropped before [`InFlight::finish`], the slot
/// falls back to `Unrestricted` so waiters are released.
struct InFlight<'a> {
    inner: &'a LedgerInner,
    subject: &'a SubjectId,
    slot: &'a Arc<SubjectSlot>,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a LedgerInner, subject: &'a SubjectId, slot: &'a Arc<SubjectSlot>) -> Self {
        Self {
            inner,
            subject,
            slot,
            done: false,
        }
    }

    fn finish(mut self, state: SlotState) {
        self.done = true;
        let unrestricted = matches!(state, SlotState::Unrestricted);
        self.slot.settle(state);
        if unrestricted {
            self.inner.prune(self.subject, self.slot);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        warn!(subject = %self.subject, "Provider call abandoned, clearing subject state");
        self.slot.settle(SlotState::Unrestricted);
        self.inner.prune(self.subject, self.slot);
    }
}

#[derive(Clone, Copy)]
enum AddStep {
    Wait,
    Extended { remaining: Duration },
    Apply { start: Instant, end: Instant },
}

struct LedgerInner {
    actions: Arc<dyn ActionProvider>,
    presence: Arc<dyn PresenceProvider>,
    scheduler: Arc<dyn TimerScheduler>,
    events: Arc<dyn EventSink>,
    slots: RwLock<HashMap<SubjectId, Arc<SubjectSlot>>>,
}

impl LedgerInner {
    fn slot(&self, subject: &SubjectId) -> Arc<SubjectSlot> {
        if let Some(slot) = self.slots.read().get(subject) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        let slot = slots
            .entry(subject.clone())
            .or_insert_with(|| Arc::new(SubjectSlot::new()));
        Arc::clone(slot)
    }

    fn existing_slot(&self, subject: &SubjectId) -> Option<Arc<SubjectSlot>> {
        self.slots.read().get(subject).cloned()
    }

    /// Drop the slot once it is unrestricted and nobody else holds it.
    fn prune(&self, subject: &SubjectId, slot: &Arc<SubjectSlot>) {
        let mut slots = self.slots.write();
        // One reference held by the map, one by the caller.
        if Arc::strong_count(slot) != 2 || !matches!(*slot.state.lock(), SlotState::Unrestricted) {
            return;
        }
        if let Some(current) = slots.get(subject)
            && Arc::ptr_eq(current, slot)
        {
            slots.remove(subject);
        }
    }

    fn schedule_expiry(self: &Arc<Self>, subject: &SubjectId, end: Instant, now: Instant) -> TimerHandle {
        let ledger = Arc::downgrade(self);
        let subject = subject.clone();
        self.scheduler.schedule(
            end.saturating_duration_since(now),
            Box::pin(async move {
                if let Some(ledger) = ledger.upgrade() {
                    ledger.expire(subject, end).await;
                }
            }),
        )
    }

    async fn expire(self: Arc<Self>, subject: SubjectId, scheduled_end: Instant) {
        let Some(slot) = self.existing_slot(&subject) else {
            debug!(subject = %subject, "Expiry fired for unknown subject, ignoring");
            return;
        };

        let record = {
            let mut state = slot.state.lock();
            match std::mem::replace(&mut *state, SlotState::Releasing) {
                SlotState::Restricted(record) if record.end == scheduled_end => record,
                other => {
                    *state = other;
                    debug!(subject = %subject, "Stale expiry ignored");
                    return;
                }
            }
        };

        let total = Instant::now().saturating_duration_since(record.start);
        let in_flight = InFlight::new(&self, &subject, &slot);
        let result = self.actions.remove_restriction(&subject).await;

        // The record is gone whether or not the provider call succeeded.
        in_flight.finish(SlotState::Unrestricted);

        match result {
            Ok(()) => {
                info!(subject = %subject, total_secs = total.as_secs(), "Mute expired");
                self.events.emit(ModerationEvent::MuteReleased {
                    subject,
                    channel: record.channel,
                    total_secs: total.as_secs(),
                    manual: false,
                });
            }
            Err(e) => {
                warn!(subject = %subject, error = %e, "Failed to lift expired mute");
                self.events.emit(ModerationEvent::ReleaseFailed {
                    subject,
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Per-subject mute ledger.
///
/// Cheap to clone; clones share the same records.
#[derive(Clone)]
pub struct MuteLedger {
    inner: Arc<LedgerInner>,
}

impl MuteLedger {
    pub fn new(
        actions: Arc<dyn ActionProvider>,
        presence: Arc<dyn PresenceProvider>,
        scheduler: Arc<dyn TimerScheduler>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner: Arc::new(LedgerInner {
                actions,
                presence,
                scheduler,
                events,
                slots: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Mute `subject` for `duration`, or extend its active mute by `duration`.
    ///
    /// A fresh mute calls the action provider and keeps a record only if
    /// that call succeeds. Extending never calls the provider and never
    /// moves the start of the current restriction.
    pub async fn add_mute(
        &self,
        subject: &SubjectId,
        duration: MuteDuration,
        channel: &ChannelId,
    ) -> Result<MuteOutcome, MuteError> {
        if self.inner.presence.current_channel(subject).await.is_none() {
            return Err(MuteError::TargetNotReachable(subject.clone()));
        }

        let slot = self.inner.slot(subject);
        let (start, end) = loop {
            let settled = slot.settled.notified();
            let step = {
                let mut state = slot.state.lock();
                let now = Instant::now();
                let step = match &mut *state {
                    SlotState::Applying | SlotState::Releasing => AddStep::Wait,
                    SlotState::Restricted(record) if record.end > now => {
                        record.end = capped_end(record.end, duration.as_duration(), now);
                        self.inner.scheduler.cancel(&record.timer);
                        record.timer = self.inner.schedule_expiry(subject, record.end, now);
                        AddStep::Extended {
                            remaining: record.end - now,
                        }
                    }
                    _ => AddStep::Apply {
                        start: now,
                        end: capped_end(now, duration.as_duration(), now),
                    },
                };
                if let AddStep::Apply { .. } = step {
                    if let SlotState::Restricted(stale) =
                        std::mem::replace(&mut *state, SlotState::Applying)
                    {
                        debug!(subject = %subject, "Restarting mute over an elapsed record");
                        self.inner.scheduler.cancel(&stale.timer);
                    }
                }
                step
            };

            match step {
                AddStep::Wait => settled.await,
                AddStep::Extended { remaining } => {
                    info!(
                        subject = %subject,
                        added_secs = duration.secs(),
                        remaining_secs = remaining.as_secs(),
                        "Mute extended"
                    );
                    self.inner.events.emit(ModerationEvent::MuteExtended {
                        subject: subject.clone(),
                        channel: channel.clone(),
                        added_secs: duration.secs(),
                        remaining_secs: remaining.as_secs(),
                    });
                    return Ok(MuteOutcome::Extended {
                        added: duration,
                        remaining,
                    });
                }
                AddStep::Apply { start, end } => break (start, end),
            }
        };

        let in_flight = InFlight::new(&self.inner, subject, &slot);
        let result = self.inner.actions.apply_restriction(subject).await;

        match result {
            Ok(()) => {
                let timer = self.inner.schedule_expiry(subject, end, Instant::now());
                in_flight.finish(SlotState::Restricted(MuteRecord {
                    channel: channel.clone(),
                    start,
                    end,
                    timer,
                }));
                info!(subject = %subject, duration_secs = duration.secs(), "Mute applied");
                self.inner.events.emit(ModerationEvent::MuteApplied {
                    subject: subject.clone(),
                    channel: channel.clone(),
                    duration_secs: duration.secs(),
                });
                Ok(MuteOutcome::Applied { duration })
            }
            Err(e) => {
                in_flight.finish(SlotState::Unrestricted);
                warn!(subject = %subject, error = %e, "Failed to apply mute");
                Err(e.into())
            }
        }
    }

    /// Lift any restriction on `subject` immediately.
    ///
    /// The provider is always asked to remove the restriction, even when the
    /// ledger holds no record. If that call fails the local record is still
    /// cleared and the provider error is returned.
    pub async fn manual_release(&self, subject: &SubjectId) -> Result<ReleaseOutcome, MuteError> {
        let slot = self.inner.slot(subject);
        let record = loop {
            let settled = slot.settled.notified();
            let taken = {
                let mut state = slot.state.lock();
                match &*state {
                    SlotState::Applying | SlotState::Releasing => None,
                    _ => Some(std::mem::replace(&mut *state, SlotState::Releasing)),
                }
            };

            match taken {
                Some(SlotState::Restricted(record)) => {
                    self.inner.scheduler.cancel(&record.timer);
                    break Some(record);
                }
                Some(_) => break None,
                None => settled.await,
            }
        };

        let muted_for = record
            .as_ref()
            .map(|r| Instant::now().saturating_duration_since(r.start));
        let in_flight = InFlight::new(&self.inner, subject, &slot);
        let result = self.inner.actions.remove_restriction(subject).await;

        in_flight.finish(SlotState::Unrestricted);

        match result {
            Ok(()) => {
                if let (Some(record), Some(total)) = (record, muted_for) {
                    info!(subject = %subject, total_secs = total.as_secs(), "Mute released manually");
                    self.inner.events.emit(ModerationEvent::MuteReleased {
                        subject: subject.clone(),
                        channel: record.channel,
                        total_secs: total.as_secs(),
                        manual: true,
                    });
                }
                Ok(ReleaseOutcome {
                    was_restricted: muted_for.is_some(),
                    muted_for,
                })
            }
            Err(e) => {
                warn!(subject = %subject, error = %e, "Failed to lift mute");
                self.inner.events.emit(ModerationEvent::ReleaseFailed {
                    subject: subject.clone(),
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// The active restriction on `subject`, if any
    pub fn snapshot(&self, subject: &SubjectId) -> Option<MuteSnapshot> {
        let slot = self.inner.existing_slot(subject)?;
        let state = slot.state.lock();
        let snapshot = match &*state {
            SlotState::Restricted(record) => Some(MuteSnapshot {
                subject: subject.clone(),
                channel: record.channel.clone(),
                started_at: record.start,
                ends_at: record.end,
            }),
            _ => None,
        };
        snapshot
    }

    pub fn is_restricted(&self, subject: &SubjectId) -> bool {
        self.snapshot(subject).is_some()
    }

    /// Number of subjects currently holding a record
    pub fn active_count(&self) -> usize {
        self.inner
            .slots
            .read()
            .values()
            .filter(|slot| matches!(*slot.state.lock(), SlotState::Restricted(_)))
            .count()
    }

    /// Snapshots of every active restriction, ordered by subject
    pub fn active(&self) -> Vec<MuteSnapshot> {
        let mut subjects: Vec<SubjectId> = self.inner.slots.read().keys().cloned().collect();
        subjects.sort();
        subjects.iter().filter_map(|s| self.snapshot(s)).collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Hand-written collaborators shared by the use case tests.

    use super::*;
    use crate::timer::TokioTimerScheduler;
    use async_trait::async_trait;
    use futures::future::BoxFuture;
    use std::collections::{BTreeSet, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use votemute_domain::ModerationEvent;

    #[derive(Default)]
    pub struct MockActionProvider {
        pub applied: Mutex<Vec<SubjectId>>,
        pub removed: Mutex<Vec<SubjectId>>,
        pub fail_apply: AtomicBool,
        pub fail_remove: AtomicBool,
        pub apply_delay: Mutex<Option<Duration>>,
        pub remove_delay: Mutex<Option<Duration>>,
    }

    impl MockActionProvider {
        pub fn apply_count(&self) -> usize {
            self.applied.lock().len()
        }

        pub fn remove_count(&self) -> usize {
            self.removed.lock().len()
        }
    }

    #[async_trait]
    impl ActionProvider for MockActionProvider {
        async fn apply_restriction(&self, subject: &SubjectId) -> Result<(), ProviderError> {
            let delay = *self.apply_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_apply.load(Ordering::SeqCst) {
                return Err(ProviderError::PermissionDenied("mute".to_string()));
            }
            self.applied.lock().push(subject.clone());
            Ok(())
        }

        async fn remove_restriction(&self, subject: &SubjectId) -> Result<(), ProviderError> {
            let delay = *self.remove_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.removed.lock().push(subject.clone());
            if self.fail_remove.load(Ordering::SeqCst) {
                return Err(ProviderError::RequestFailed("unmute".to_string()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MockPresence {
        pub channels: Mutex<HashMap<SubjectId, ChannelId>>,
        pub bots: Mutex<HashSet<SubjectId>>,
    }

    impl MockPresence {
        pub fn join(&self, subject: &str, channel: &str) {
            self.channels
                .lock()
                .insert(SubjectId::from(subject), ChannelId::from(channel));
        }

        pub fn join_bot(&self, subject: &str, channel: &str) {
            self.join(subject, channel);
            self.bots.lock().insert(SubjectId::from(subject));
        }

        pub fn leave(&self, subject: &str) {
            self.channels.lock().remove(&SubjectId::from(subject));
        }
    }

    #[async_trait]
    impl PresenceProvider for MockPresence {
        async fn current_channel(&self, subject: &SubjectId) -> Option<ChannelId> {
            self.channels.lock().get(subject).cloned()
        }

        async fn occupants(&self, channel: &ChannelId) -> BTreeSet<SubjectId> {
            let bots = self.bots.lock();
            self.channels
                .lock()
                .iter()
                .filter(|(subject, c)| *c == channel && !bots.contains(*subject))
                .map(|(subject, _)| subject.clone())
                .collect()
        }
    }

    #[derive(Default)]
    pub struct RecordingEvents(pub Mutex<Vec<ModerationEvent>>);

    impl RecordingEvents {
        pub fn types(&self) -> Vec<&'static str> {
            self.0.lock().iter().map(|e| e.event_type()).collect()
        }
    }

    impl EventSink for RecordingEvents {
        fn emit(&self, event: ModerationEvent) {
            self.0.lock().push(event);
        }
    }

    /// Tokio scheduler that tracks which timers are still pending.
    #[derive(Default)]
    pub struct CountingScheduler {
        inner: TokioTimerScheduler,
        live: Arc<Mutex<HashSet<u64>>>,
    }

    impl CountingScheduler {
        pub fn live(&self) -> usize {
            self.live.lock().len()
        }
    }

    impl TimerScheduler for CountingScheduler {
        fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle {
            let live = Arc::clone(&self.live);
            let id = Arc::new(OnceLock::new());
            let fired_id = Arc::clone(&id);
            let handle = self.inner.schedule(
                delay,
                Box::pin(async move {
                    if let Some(id) = fired_id.get() {
                        live.lock().remove(id);
                    }
                    task.await;
                }),
            );
            let _ = id.set(handle.id());
            self.live.lock().insert(handle.id());
            handle
        }

        fn cancel(&self, handle: &TimerHandle) {
            self.live.lock().remove(&handle.id());
            handle.cancel();
        }
    }

    /// Scheduler that never fires on its own; tests run stored tasks by hand.
    #[derive(Default)]
    pub struct ManualScheduler {
        pub tasks: Mutex<Vec<(TimerHandle, Option<BoxFuture<'static, ()>>)>>,
        next_id: Mutex<u64>,
    }

    impl ManualScheduler {
        pub fn take_task(&self, index: usize) -> Option<BoxFuture<'static, ()>> {
            self.tasks.lock().get_mut(index).and_then(|(_, task)| task.take())
        }

        pub fn scheduled(&self) -> usize {
            self.tasks.lock().len()
        }
    }

    impl TimerScheduler for ManualScheduler {
        fn schedule(&self, _delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            let handle = TimerHandle::new(*next_id, tokio_util::sync::CancellationToken::new());
            self.tasks.lock().push((handle.clone(), Some(task)));
            handle
        }
    }
}
