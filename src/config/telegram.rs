//! Telegram Bot API configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::telegram::TelegramConfig;
use crate::application::MembershipClientConfig;

use super::error::ValidationError;

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,

    /// API base URL, overridable for self-hosted Bot API servers
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per membership check, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt, in milliseconds
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl BotConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the API client configuration
    pub fn api_config(&self) -> TelegramConfig {
        TelegramConfig::new(self.bot_token.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout())
    }

    /// Build the membership client retry configuration
    pub fn client_config(&self) -> MembershipClientConfig {
        MembershipClientConfig {
            max_attempts: self.max_attempts,
            base_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// Validate Telegram configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bot_token.is_empty() {
            return Err(ValidationError::MissingRequired("TELEGRAM_BOT_TOKEN"));
        }
        // BotFather tokens look like "<numeric id>:<secret>"
        if !self.bot_token.contains(':') {
            return Err(ValidationError::InvalidBotToken);
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::MissingRequired("TELEGRAM_MAX_ATTEMPTS"));
        }
        Ok(())
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout() -> u64 {
    2
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    300
}
