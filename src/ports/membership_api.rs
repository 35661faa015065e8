//! MembershipApi port - the external membership-check call.
//!
//! Implementations connect to the external membership service (the
//! Telegram Bot API in production) and translate between its wire format
//! and our domain types. The error taxonomy is the contract the
//! membership client's retry and breaker logic is built on.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::{ChannelId, UserId};
use crate::domain::verification::ChannelMemberStatus;

/// Port for membership lookups against the external API.
#[async_trait]
pub trait MembershipApi: Send + Sync {
    /// Resolve the user's current status within a channel.
    ///
    /// One invocation is one network attempt; retry policy lives in the
    /// caller, not the adapter.
    async fn member_status(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<ChannelMemberStatus, MembershipApiError>;
}

/// Errors from the membership API.
///
/// Transient variants are availability failures: they are retried and
/// recorded against the circuit breaker. Permanent variants describe the
/// request, not the service, and must do neither. `Throttled` is its own
/// category: the server asked us to slow down, which the rate limiter
/// honors, but it is not an availability failure.
#[derive(Debug, thiserror::Error)]
pub enum MembershipApiError {
    /// The API throttled the call and mandated a wait.
    #[error("throttled: retry after {retry_after:?}")]
    Throttled {
        /// Server-mandated wait before the next call.
        retry_after: Duration,
    },

    /// The request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// The API reported a server-side failure.
    #[error("server error: status {status}")]
    ServerError {
        /// HTTP status code.
        status: u16,
    },

    /// The channel does not exist or the bot cannot see it.
    #[error("channel {channel_id} not found")]
    ChannelNotFound { channel_id: ChannelId },

    /// The bot lacks the rights to inspect the channel's members.
    #[error("bot not authorized for channel {channel_id}")]
    BotNotAuthorized { channel_id: ChannelId },

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

impl MembershipApiError {
    /// Creates a throttled error.
    pub fn throttled(retry_after: Duration) -> Self {
        Self::Throttled { retry_after }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true for availability failures worth retrying.
    ///
    /// Only these count toward the circuit breaker. Throttling is excluded:
    /// it feeds the rate limiter instead.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MembershipApiError::Timeout { .. }
                | MembershipApiError::Network(_)
                | MembershipApiError::ServerError { .. }
        )
    }
}
