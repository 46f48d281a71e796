//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod action_provider;
pub mod event_sink;
pub mod presence;
pub mod random_source;
