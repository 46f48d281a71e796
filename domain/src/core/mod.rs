//! Core domain concepts shared across the engine.
//!
//! - [`ids`]: opaque identifiers for subjects, channels and proposals
//! - [`duration::MuteDuration`]: a validated, positive mute length
//! - [`error::DomainError`]: validation errors

pub mod duration;
pub mod error;
pub mod ids;
