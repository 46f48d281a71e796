//! In-process providers
//!
//! Presence and action providers that keep their state in memory. They back
//! the moderation console and stand in for a chat platform during local runs.

mod action;
mod presence;

pub use action::InMemoryActionProvider;
pub use presence::InMemoryPresence;
