//! Port for structured moderation events.
//!
//! Defines the [`EventSink`] trait that receives every [`ModerationEvent`]
//! the engine emits (mute applied, vote started, proposal expired, ...).
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! diagnostics, while this port carries the events that a notification
//! layer turns into user-facing messages.

use std::sync::Arc;
use votemute_domain::ModerationEvent;

/// Receives moderation events.
///
/// `emit` is synchronous and non-fallible so that a slow or broken sink
/// never disturbs a state transition. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ModerationEvent);
}

/// No-op implementation for tests and when events are not consumed.
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&self, _event: ModerationEvent) {}
}

/// Fans each event out to several sinks, in order.
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for CompositeEventSink {
    fn emit(&self, event: ModerationEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(event.clone());
            }
            last.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use votemute_domain::{ProposalId, SubjectId};

    #[derive(Default)]
    struct Recording(Mutex<Vec<&'static str>>);

    impl EventSink for Recording {
        fn emit(&self, event: ModerationEvent) {
            self.0.lock().push(event.event_type());
        }
    }

    #[test]
    fn test_composite_delivers_to_every_sink() {
        let a = Arc::new(Recording::default());
        let b = Arc::new(Recording::default());
        let composite = CompositeEventSink::new(vec![a.clone(), b.clone()]);

        composite.emit(ModerationEvent::ProposalExpired {
            proposal: ProposalId::new(1),
            target: SubjectId::from("t"),
        });

        assert_eq!(*a.0.lock(), vec!["proposal_expired"]);
        assert_eq!(*b.0.lock(), vec!["proposal_expired"]);
    }

    #[test]
    fn test_empty_composite_is_noop() {
        let composite = CompositeEventSink::new(vec![]);
        assert!(composite.is_empty());
        composite.emit(ModerationEvent::ProposalExpired {
            proposal: ProposalId::new(1),
            target: SubjectId::from("t"),
        });
    }
}
