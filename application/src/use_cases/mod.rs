//! Use cases
//!
//! The moderation engine: the mute ledger, the vote tally that feeds it,
//! and the roulette feature layered on top of both.

pub mod mute_ledger;
pub mod roulette;
pub mod vote_tally;
