//! Domain layer for votemute
//!
//! This crate contains the value objects and pure rules of the moderation engine.
//! It has no dependencies on the async runtime, infrastructure or presentation.
//!
//! # Core Concepts
//!
//! ## Mute
//!
//! A time-bounded silence restriction placed on a [`SubjectId`] (a channel
//! participant). Durations are whole positive seconds ([`MuteDuration`]) and
//! stack while a restriction is still active.
//!
//! ## Vote-mute
//!
//! A proposal to mute a target, decided by a [`QuorumRule`] over the set of
//! participants currently sharing the target's channel. Eligibility is never
//! cached; [`QuorumCheck`] evaluates raw votes against a live eligible set.

pub mod core;
pub mod event;
pub mod quorum;

// Re-export commonly used types
pub use core::{
    duration::MuteDuration,
    error::DomainError,
    ids::{ChannelId, ProposalId, SubjectId},
};
pub use event::{InvalidationReason, ModerationEvent};
pub use quorum::{QuorumCheck, QuorumRule};
