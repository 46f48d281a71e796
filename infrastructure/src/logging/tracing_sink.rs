use tracing::info;
use votemute_application::EventSink;
use votemute_domain::ModerationEvent;

/// Logs every moderation event at info level under the `votemute::events` target.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: ModerationEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => info!(target: "votemute::events", kind = event.event_type(), %json, "event"),
            Err(_) => info!(target: "votemute::events", kind = event.event_type(), "event"),
        }
    }
}
