//! Application-level configuration.
//!
//! These types control how the engine behaves at runtime. They are built by
//! the infrastructure config loader from the TOML file and never read files
//! themselves.

use std::time::Duration;
use votemute_domain::QuorumRule;

/// Vote-mute behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteConfig {
    /// Bounded lifetime of an open proposal.
    pub lifetime: Duration,
    /// Rule deciding when a proposal becomes binding.
    pub rule: QuorumRule,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(60),
            rule: QuorumRule::Majority,
        }
    }
}

/// Roulette (random fairness selection) behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouletteConfig {
    /// Minimum time between two spins by the same invoker.
    pub cooldown: Duration,
    /// Inclusive lower bound of the random mute length, in seconds.
    pub min_duration_secs: u64,
    /// Inclusive upper bound of the random mute length, in seconds.
    pub max_duration_secs: u64,
}

impl Default for RouletteConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(30),
            min_duration_secs: 10,
            max_duration_secs: 60,
        }
    }
}

/// Container for everything the engine needs from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub vote: VoteConfig,
    pub roulette: RouletteConfig,
}

impl EngineConfig {
    pub fn with_vote_lifetime_secs(mut self, secs: u64) -> Self {
        self.vote.lifetime = Duration::from_secs(secs);
        self
    }

    pub fn with_rule(mut self, rule: QuorumRule) -> Self {
        self.vote.rule = rule;
        self
    }
}
