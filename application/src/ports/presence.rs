//! Presence provider port
//!
//! Reports, at call time, which subjects occupy which channel. Answers may
//! race with membership changes; callers accept point-in-time consistency.

use async_trait::async_trait;
use std::collections::BTreeSet;
use votemute_domain::{ChannelId, SubjectId};

#[async_trait]
pub trait PresenceProvider: Send + Sync {
    /// The channel the subject currently occupies, if any
    async fn current_channel(&self, subject: &SubjectId) -> Option<ChannelId>;

    /// Current occupants of a channel, excluding automated participants
    async fn occupants(&self, channel: &ChannelId) -> BTreeSet<SubjectId>;
}
