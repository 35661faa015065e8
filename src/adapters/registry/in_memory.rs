//! In-memory group registry for testing and single-process deployments.
//!
//! Production deployments back the registry with whatever store the
//! dashboard writes group configuration to; this adapter keeps the same
//! read path over a seeded map.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::domain::foundation::{ChannelId, GroupId, UserId};
use crate::ports::{GroupRegistry, RegistryError};

/// In-memory registry seeded through `register_group` and `grant_admin`.
#[derive(Debug, Default)]
pub struct InMemoryGroupRegistry {
    groups: RwLock<HashMap<GroupId, GroupConfig>>,
}

#[derive(Debug, Default)]
struct GroupConfig {
    required_channels: Vec<ChannelId>,
    admins: HashSet<UserId>,
}

impl InMemoryGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group with the channels that gate it.
    ///
    /// Replaces the channel list if the group was already registered.
    pub async fn register_group(&self, group_id: GroupId, channels: Vec<ChannelId>) {
        let mut groups = self.groups.write().await;
        groups.entry(group_id).or_default().required_channels = channels;
    }

    /// Marks a user as an administrator of a group.
    ///
    /// Registers the group with an empty channel list if it was unknown.
    pub async fn grant_admin(&self, group_id: GroupId, user_id: UserId) {
        let mut groups = self.groups.write().await;
        groups.entry(group_id).or_default().admins.insert(user_id);
    }
}

#[async_trait]
impl GroupRegistry for InMemoryGroupRegistry {
    async fn required_channels(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<ChannelId>, RegistryError> {
        let groups = self.groups.read().await;
        groups
            .get(&group_id)
            .map(|config| config.required_channels.clone())
            .ok_or(RegistryError::GroupNotRegistered { group_id })
    }

    async fn is_admin(&self, group_id: GroupId, user_id: UserId) -> Result<bool, RegistryError> {
        let groups = self.groups.read().await;
        groups
            .get(&group_id)
            .map(|config| config.admins.contains(&user_id))
            .ok_or(RegistryError::GroupNotRegistered { group_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> GroupId {
        GroupId::new(-100500)
    }

    #[tokio::test]
    async fn registered_group_returns_its_channels() {
        let registry = InMemoryGroupRegistry::new();
        let channels = vec![ChannelId::new(-1001), ChannelId::new(-1002)];
        registry.register_group(group(), channels.clone()).await;

        let got = registry.required_channels(group()).await.unwrap();

        assert_eq!(got, channels);
    }

    #[tokio::test]
    async fn unregistered_group_is_an_explicit_error() {
        let registry = InMemoryGroupRegistry::new();

        let err = registry.required_channels(group()).await.unwrap_err();

        assert!(matches!(err, RegistryError::GroupNotRegistered { .. }));
    }

    #[tokio::test]
    async fn admin_lookup_distinguishes_members() {
        let registry = InMemoryGroupRegistry::new();
        let admin = UserId::new(7).unwrap();
        let regular = UserId::new(8).unwrap();
        registry.register_group(group(), vec![]).await;
        registry.grant_admin(group(), admin).await;

        assert!(registry.is_admin(group(), admin).await.unwrap());
        assert!(!registry.is_admin(group(), regular).await.unwrap());
    }

    #[tokio::test]
    async fn re_registering_replaces_the_channel_list() {
        let registry = InMemoryGroupRegistry::new();
        registry
            .register_group(group(), vec![ChannelId::new(-1001)])
            .await;
        registry
            .register_group(group(), vec![ChannelId::new(-1002)])
            .await;

        let got = registry.required_channels(group()).await.unwrap();

        assert_eq!(got, vec![ChannelId::new(-1002)]);
    }
}
