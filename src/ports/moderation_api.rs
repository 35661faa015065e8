//! ModerationApi port - restriction and messaging side effects.
//!
//! The enforcement engine speaks to the group through this seam:
//! restricting members who fail verification, lifting restrictions once
//! they comply, and managing the warning messages in between.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::{ChannelId, GroupId, MessageId, UserId};

/// Port for moderation side effects in a protected group.
#[async_trait]
pub trait ModerationApi: Send + Sync {
    /// Remove the user's ability to post in the group.
    async fn restrict_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<(), ModerationApiError>;

    /// Restore the user's default permissions in the group.
    async fn lift_restrictions(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<(), ModerationApiError>;

    /// Post a warning telling the user which channels they must join.
    ///
    /// Returns the id of the posted message so it can be cleaned up later.
    async fn send_warning(
        &self,
        group_id: GroupId,
        user_id: UserId,
        missing_channels: &[ChannelId],
    ) -> Result<MessageId, ModerationApiError>;

    /// Delete a previously posted message.
    async fn delete_message(
        &self,
        group_id: GroupId,
        message_id: MessageId,
    ) -> Result<(), ModerationApiError>;
}

/// Errors from the moderation API.
#[derive(Debug, thiserror::Error)]
pub enum ModerationApiError {
    /// The API throttled the call and mandated a wait.
    #[error("throttled: retry after {retry_after:?}")]
    Throttled { retry_after: Duration },

    /// The request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// The API reported a server-side failure.
    #[error("server error: status {status}")]
    ServerError { status: u16 },

    /// The bot lacks the rights for this action in the group.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The bot token was rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The API rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to parse the API response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ModerationApiError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
