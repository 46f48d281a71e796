//! Application layer for votemute
//!
//! This crate contains the moderation engine, port definitions, timer
//! scheduling and engine configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod timer;
pub mod use_cases;

// Re-export commonly used types
pub use config::{EngineConfig, RouletteConfig, VoteConfig};
pub use ports::{
    action_provider::{ActionProvider, ProviderError},
    event_sink::{CompositeEventSink, EventSink, NoEvents},
    presence::PresenceProvider,
    random_source::{NetworkError, RandomSource},
};
pub use timer::{TimerHandle, TimerScheduler, TokioTimerScheduler};
pub use use_cases::mute_ledger::{
    MAX_MUTE_WINDOW, MuteError, MuteLedger, MuteOutcome, MuteSnapshot, ReleaseOutcome,
};
pub use use_cases::roulette::{RouletteError, RouletteSpin, RouletteUseCase};
pub use use_cases::vote_tally::{ProposalSnapshot, VoteError, VoteOutcome, VoteTally};
