//! Vote-mute quorum domain
//!
//! # Core Concepts
//!
//! A proposal collects raw voter ids. Whether it is binding is decided at
//! evaluation time only:
//!
//! ```text
//! occupants(target channel) ──minus target──▶ eligible
//!                                                │
//! votes ──────────────────── ∩ ──────────────────┘ ──▶ valid_votes
//!
//! resolved  ⇔  valid_votes ≥ rule.required_votes(|eligible|)
//! ```
//!
//! Nothing here caches eligibility; a voter who leaves the channel simply
//! stops counting at the next evaluation.

pub mod rule;
pub mod tally;

pub use rule::QuorumRule;
pub use tally::{QuorumCheck, eligible_voters};
