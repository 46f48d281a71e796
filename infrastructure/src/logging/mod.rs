//! Logging infrastructure: moderation event sinks.
//!
//! Provides [`JsonlEventLog`], a JSONL file writer, and [`TracingEventSink`],
//! which forwards events to `tracing`. Both implement the
//! [`EventSink`](votemute_application::EventSink) port.

mod jsonl_event_log;
mod tracing_sink;

pub use jsonl_event_log::JsonlEventLog;
pub use tracing_sink::TracingEventSink;
