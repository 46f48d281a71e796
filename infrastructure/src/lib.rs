//! Infrastructure layer for votemute
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod memory;
pub mod random;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigLoader, ConfigValidationError, FileConfig, RandomSourceKind, Severity,
};
pub use logging::{JsonlEventLog, TracingEventSink};
pub use memory::{InMemoryActionProvider, InMemoryPresence};
pub use random::{HttpRandomSource, LocalRandomSource};
