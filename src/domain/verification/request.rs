//! Per-event verification request.

use crate::domain::foundation::{ChannelId, GroupId, UserId};

/// Ephemeral state for one verification pass.
///
/// Created per event by the orchestrator and dropped once the aggregate
/// verdict is produced; never persisted. Required channels are
/// deduplicated while preserving their configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub user_id: UserId,
    pub group_id: GroupId,
    required_channels: Vec<ChannelId>,
}

impl VerificationRequest {
    /// Creates a request, deduplicating the required channel list.
    pub fn new(user_id: UserId, group_id: GroupId, channels: Vec<ChannelId>) -> Self {
        let mut required_channels = Vec::with_capacity(channels.len());
        for channel in channels {
            if !required_channels.contains(&channel) {
                required_channels.push(channel);
            }
        }
        Self {
            user_id,
            group_id,
            required_channels,
        }
    }

    /// The channels the user must be a member of.
    pub fn required_channels(&self) -> &[ChannelId] {
        &self.required_channels
    }

    /// Returns true when the group requires no channels at all.
    pub fn is_trivially_satisfied(&self) -> bool {
        self.required_channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_channels_are_collapsed() {
        let request = VerificationRequest::new(
            UserId::new(1).unwrap(),
            GroupId::new(-10),
            vec![
                ChannelId::new(-100),
                ChannelId::new(-200),
                ChannelId::new(-100),
            ],
        );

        assert_eq!(
            request.required_channels(),
            &[ChannelId::new(-100), ChannelId::new(-200)]
        );
    }

    #[test]
    fn configured_order_is_preserved() {
        let request = VerificationRequest::new(
            UserId::new(1).unwrap(),
            GroupId::new(-10),
            vec![ChannelId::new(-300), ChannelId::new(-100)],
        );

        assert_eq!(
            request.required_channels(),
            &[ChannelId::new(-300), ChannelId::new(-100)]
        );
    }

    #[test]
    fn empty_channel_list_is_trivially_satisfied() {
        let request =
            VerificationRequest::new(UserId::new(1).unwrap(), GroupId::new(-10), Vec::new());
        assert!(request.is_trivially_satisfied());
    }
}
