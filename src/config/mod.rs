//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `GATEWARDEN_` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use gatewarden::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Checking up to {} channels in parallel", config.verification.max_concurrent);
//! ```

mod audit;
mod breaker;
mod cache;
mod error;
mod limiter;
mod telegram;
mod verification;

pub use audit::AuditConfig;
pub use breaker::BreakerConfig;
pub use cache::CacheConfig;
pub use error::{ConfigError, ValidationError};
pub use limiter::LimiterConfig;
pub use telegram::BotConfig;
pub use verification::ChecksConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the engine. Load using
/// [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Telegram Bot API configuration (token, base URL, retries)
    pub telegram: BotConfig,

    /// Verification cache configuration (TTLs, jitter, optional Redis)
    #[serde(default)]
    pub cache: CacheConfig,

    /// Outbound rate limiter configuration (token bucket)
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Circuit breaker configuration (threshold, window, reset backoff)
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Verification pass configuration (fan-out, deadline)
    #[serde(default)]
    pub verification: ChecksConfig,

    /// Audit log configuration (path, queue, workers)
    #[serde(default)]
    pub audit: AuditConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `GATEWARDEN` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `GATEWARDEN__TELEGRAM__BOT_TOKEN=123:abc` -> `telegram.bot_token`
    /// - `GATEWARDEN__LIMITER__CAPACITY=40` -> `limiter.capacity = 40`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GATEWARDEN")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Performs semantic validation of configuration:
    /// - Bot token and URL formats
    /// - TTL asymmetry between positive and negative cache entries
    /// - Limiter, breaker, and fan-out bounds
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.telegram.validate()?;
        self.cache.validate()?;
        self.limiter.validate()?;
        self.breaker.validate()?;
        self.verification.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}
