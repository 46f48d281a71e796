use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;
use votemute_application::PresenceProvider;
use votemute_domain::{ChannelId, SubjectId};

#[derive(Debug, Clone)]
struct Occupancy {
    channel: ChannelId,
    bot: bool,
}

/// Channel membership held in memory.
///
/// A subject occupies at most one channel; joining another moves it.
#[derive(Debug, Default)]
pub struct InMemoryPresence {
    members: RwLock<HashMap<SubjectId, Occupancy>>,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a subject in a channel, moving it if it was elsewhere.
    pub fn join(&self, subject: SubjectId, channel: ChannelId, bot: bool) {
        debug!(subject = %subject, channel = %channel, bot, "Subject joined");
        self.members
            .write()
            .insert(subject, Occupancy { channel, bot });
    }

    /// Remove a subject from its channel. Returns the channel it left.
    pub fn leave(&self, subject: &SubjectId) -> Option<ChannelId> {
        let left = self.members.write().remove(subject).map(|o| o.channel);
        if let Some(channel) = &left {
            debug!(subject = %subject, channel = %channel, "Subject left");
        }
        left
    }

    /// Every non-empty channel with all of its members, bots included
    pub fn channels(&self) -> Vec<(ChannelId, Vec<SubjectId>)> {
        let mut channels: HashMap<ChannelId, Vec<SubjectId>> = HashMap::new();
        for (subject, occupancy) in self.members.read().iter() {
            channels
                .entry(occupancy.channel.clone())
                .or_default()
                .push(subject.clone());
        }
        let mut channels: Vec<_> = channels.into_iter().collect();
        for (_, members) in channels.iter_mut() {
            members.sort();
        }
        channels.sort_by(|a, b| a.0.cmp(&b.0));
        channels
    }
}

#[async_trait]
impl PresenceProvider for InMemoryPresence {
    async fn current_channel(&self, subject: &SubjectId) -> Option<ChannelId> {
        self.members.read().get(subject).map(|o| o.channel.clone())
    }

    async fn occupants(&self, channel: &ChannelId) -> BTreeSet<SubjectId> {
        self.members
            .read()
            .iter()
            .filter(|(_, o)| &o.channel == channel && !o.bot)
            .map(|(subject, _)| subject.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SubjectId {
        SubjectId::from(s)
    }

    #[tokio::test]
    async fn test_occupants_exclude_bots() {
        let presence = InMemoryPresence::new();
        presence.join(id("alice"), ChannelId::from("voice"), false);
        presence.join(id("bob"), ChannelId::from("voice"), false);
        presence.join(id("helper"), ChannelId::from("voice"), true);
        presence.join(id("carol"), ChannelId::from("lobby"), false);

        let occupants = presence.occupants(&ChannelId::from("voice")).await;
        assert_eq!(occupants, BTreeSet::from([id("alice"), id("bob")]));
        assert_eq!(
            presence.current_channel(&id("helper")).await,
            Some(ChannelId::from("voice"))
        );
    }

    #[tokio::test]
    async fn test_join_moves_and_leave_removes() {
        let presence = InMemoryPresence::new();
        presence.join(id("alice"), ChannelId::from("voice"), false);
        presence.join(id("alice"), ChannelId::from("lobby"), false);

        assert_eq!(
            presence.current_channel(&id("alice")).await,
            Some(ChannelId::from("lobby"))
        );
        assert!(presence.occupants(&ChannelId::from("voice")).await.is_empty());

        assert_eq!(presence.leave(&id("alice")), Some(ChannelId::from("lobby")));
        assert_eq!(presence.leave(&id("alice")), None);
        assert_eq!(presence.current_channel(&id("alice")).await, None);
    }

    #[test]
    fn test_channels_listing_is_sorted() {
        let presence = InMemoryPresence::new();
        presence.join(id("bob"), ChannelId::from("voice"), false);
        presence.join(id("alice"), ChannelId::from("voice"), false);
        presence.join(id("carol"), ChannelId::from("lobby"), true);

        let channels = presence.channels();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].0, ChannelId::from("lobby"));
        assert_eq!(channels[1].1, vec![id("alice"), id("bob")]);
    }
}
