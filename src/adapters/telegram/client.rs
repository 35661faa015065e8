//! Telegram Bot API client.
//!
//! Implements both API ports over the same HTTP client: membership
//! lookups via `getChatMember` and moderation side effects via
//! `restrictChatMember`, `sendMessage` and `deleteMessage`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = TelegramConfig::new(bot_token)
//!     .with_timeout(Duration::from_secs(2));
//!
//! let api = TelegramApi::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::domain::foundation::{ChannelId, GroupId, MessageId, UserId};
use crate::domain::verification::ChannelMemberStatus;
use crate::ports::{MembershipApi, MembershipApiError, ModerationApi, ModerationApiError};

use super::types::{
    ApiResponse, ChatMemberInfo, ChatPermissions, DeleteMessageBody, GetChatMemberBody,
    RestrictChatMemberBody, SendMessageBody, SentMessage,
};

/// Wait applied when a 429 arrives without `parameters.retry_after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Configuration for the Telegram client.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token for authentication.
    bot_token: Secret<String>,
    /// Base URL for the API (default: https://api.telegram.org).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl TelegramConfig {
    /// Creates a new configuration with the given bot token.
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: Secret::new(bot_token.into()),
            base_url: "https://api.telegram.org".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the bot token (for building request URLs).
    fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }
}

/// Telegram Bot API client implementing both API ports.
///
/// Each method performs exactly one HTTP request; retry and pacing policy
/// live in the callers behind the ports.
pub struct TelegramApi {
    config: TelegramConfig,
    client: Client,
}

/// Failure of a single Bot API call, before port-specific mapping.
#[derive(Debug)]
enum CallError {
    Throttled { retry_after: Duration },
    Timeout { timeout_secs: u64 },
    Network(String),
    Server { status: u16 },
    BadRequest { description: String },
    Forbidden { description: String },
    Unauthorized,
    Parse(String),
}

impl TelegramApi {
    /// Creates a new Telegram client with the given configuration.
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the URL for a Bot API method.
    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.base_url,
            self.config.bot_token(),
            method
        )
    }

    /// Sends one request and decodes the response envelope.
    async fn execute<B, T>(&self, method: &str, body: &B) -> Result<T, CallError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CallError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    CallError::Network(format!("Connection failed: {}", e))
                } else {
                    CallError::Network(e.to_string())
                }
            })?;

        Self::decode_response(response).await
    }

    async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, CallError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CallError::Network(e.to_string()))?;
        Self::decode_body(status, &body)
    }

    /// Decodes a response body against its HTTP status.
    ///
    /// The API reports failures inside the JSON envelope; 5xx responses may
    /// carry non-JSON bodies, so the status decides when parsing fails.
    fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, CallError> {
        let envelope: ApiResponse<T> = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                return Err(if status.is_server_error() {
                    CallError::Server {
                        status: status.as_u16(),
                    }
                } else if status.is_success() {
                    CallError::Parse(format!("Failed to parse response: {}", e))
                } else {
                    CallError::Network(format!("Unexpected status {}: {}", status, e))
                });
            }
        };

        if envelope.ok {
            return envelope
                .result
                .ok_or_else(|| CallError::Parse("ok response carried no result".to_string()));
        }

        let code = envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16()));
        let description = envelope
            .description
            .unwrap_or_else(|| format!("status {}", status));

        Err(match code {
            401 | 404 => CallError::Unauthorized,
            429 => {
                let secs = envelope
                    .parameters
                    .and_then(|p| p.retry_after)
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                CallError::Throttled {
                    retry_after: Duration::from_secs(secs),
                }
            }
            403 => CallError::Forbidden { description },
            400 => CallError::BadRequest { description },
            code if (500..600).contains(&code) => CallError::Server {
                status: code as u16,
            },
            _ => CallError::Network(format!("Unexpected error {}: {}", code, description)),
        })
    }

    /// Maps a call failure for the membership port.
    fn membership_error(channel_id: ChannelId, error: CallError) -> MembershipApiError {
        match error {
            CallError::Throttled { retry_after } => MembershipApiError::Throttled { retry_after },
            CallError::Timeout { timeout_secs } => MembershipApiError::Timeout { timeout_secs },
            CallError::Network(message) => MembershipApiError::Network(message),
            CallError::Server { status } => MembershipApiError::ServerError { status },
            CallError::BadRequest { description } => {
                if description.to_ascii_lowercase().contains("chat not found") {
                    MembershipApiError::ChannelNotFound { channel_id }
                } else {
                    MembershipApiError::InvalidRequest(description)
                }
            }
            CallError::Forbidden { .. } => MembershipApiError::BotNotAuthorized { channel_id },
            CallError::Unauthorized => MembershipApiError::AuthenticationFailed,
            CallError::Parse(message) => MembershipApiError::Parse(message),
        }
    }

    /// Maps a call failure for the moderation port.
    fn moderation_error(error: CallError) -> ModerationApiError {
        match error {
            CallError::Throttled { retry_after } => ModerationApiError::Throttled { retry_after },
            CallError::Timeout { timeout_secs } => ModerationApiError::Timeout { timeout_secs },
            CallError::Network(message) => ModerationApiError::Network(message),
            CallError::Server { status } => ModerationApiError::ServerError { status },
            CallError::BadRequest { description } => ModerationApiError::InvalidRequest(description),
            CallError::Forbidden { description } => ModerationApiError::Forbidden(description),
            CallError::Unauthorized => ModerationApiError::AuthenticationFailed,
            CallError::Parse(message) => ModerationApiError::Parse(message),
        }
    }

    /// Text of the warning posted to users who fail verification.
    fn warning_text(missing_channels: &[ChannelId]) -> String {
        if missing_channels.len() == 1 {
            "You need to join the channel linked to this group before posting. \
             Join it and send your message again."
                .to_string()
        } else {
            format!(
                "You need to join all {} channels linked to this group before posting. \
                 Join them and send your message again.",
                missing_channels.len()
            )
        }
    }
}

impl std::fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramApi")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MembershipApi for TelegramApi {
    async fn member_status(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<ChannelMemberStatus, MembershipApiError> {
        let body = GetChatMemberBody {
            chat_id: channel_id.as_i64(),
            user_id: user_id.as_i64(),
        };

        let member: ChatMemberInfo = self
            .execute("getChatMember", &body)
            .await
            .map_err(|e| Self::membership_error(channel_id, e))?;

        Ok(member.effective_status())
    }
}

#[async_trait]
impl ModerationApi for TelegramApi {
    async fn restrict_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<(), ModerationApiError> {
        tracing::debug!("Restricting user {} in group {}", user_id, group_id);
        let body = RestrictChatMemberBody {
            chat_id: group_id.as_i64(),
            user_id: user_id.as_i64(),
            permissions: ChatPermissions::muted(),
        };

        let _: bool = self
            .execute("restrictChatMember", &body)
            .await
            .map_err(Self::moderation_error)?;

        Ok(())
    }

    async fn lift_restrictions(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<(), ModerationApiError> {
        tracing::debug!("Lifting restrictions for user {} in group {}", user_id, group_id);
        let body = RestrictChatMemberBody {
            chat_id: group_id.as_i64(),
            user_id: user_id.as_i64(),
            permissions: ChatPermissions::unrestricted(),
        };

        let _: bool = self
            .execute("restrictChatMember", &body)
            .await
            .map_err(Self::moderation_error)?;

        Ok(())
    }

    async fn send_warning(
        &self,
        group_id: GroupId,
        _user_id: UserId,
        missing_channels: &[ChannelId],
    ) -> Result<MessageId, ModerationApiError> {
        let body = SendMessageBody {
            chat_id: group_id.as_i64(),
            text: Self::warning_text(missing_channels),
        };

        let message: SentMessage = self
            .execute("sendMessage", &body)
            .await
            .map_err(Self::moderation_error)?;

        Ok(MessageId::new(message.message_id))
    }

    async fn delete_message(
        &self,
        group_id: GroupId,
        message_id: MessageId,
    ) -> Result<(), ModerationApiError> {
        let body = DeleteMessageBody {
            chat_id: group_id.as_i64(),
            message_id: message_id.as_i64(),
        };

        let _: bool = self
            .execute("deleteMessage", &body)
            .await
            .map_err(Self::moderation_error)?;

        Ok(())
    }
}
