//! GroupRegistry port - the configuration-store seam.
//!
//! Group owners register which channels gate their group through the
//! dashboard (out of scope here); the orchestrator reads that
//! configuration through this port, strictly read-only per request.

use async_trait::async_trait;

use crate::domain::foundation::{ChannelId, GroupId, UserId};

/// Port for per-group gating configuration.
#[async_trait]
pub trait GroupRegistry: Send + Sync {
    /// The channels a user must be a member of to post in the group.
    async fn required_channels(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<ChannelId>, RegistryError>;

    /// Whether the user administrates the group.
    ///
    /// Administrators bypass verification entirely.
    async fn is_admin(&self, group_id: GroupId, user_id: UserId) -> Result<bool, RegistryError>;
}

/// Errors from registry lookups.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The group never registered for gating.
    ///
    /// Treated as "nothing to enforce", not as a failure.
    #[error("group {group_id} is not registered")]
    GroupNotRegistered { group_id: GroupId },

    /// The registry backend is unavailable.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_registered_error_names_the_group() {
        let err = RegistryError::GroupNotRegistered {
            group_id: GroupId::new(-100200300),
        };
        assert_eq!(err.to_string(), "group -100200300 is not registered");
    }
}
