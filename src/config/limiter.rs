//! Rate limiter configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::rate_limiter::TokenBucketConfig;

use super::error::ValidationError;

/// Outbound API rate limiter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LimiterConfig {
    /// Maximum burst size in tokens
    #[serde(default = "default_capacity")]
    pub capacity: f64,

    /// Sustained tokens replenished per second
    #[serde(default = "default_refill_rate")]
    pub refill_rate_per_sec: f64,

    /// How long a check may wait for a token, in milliseconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_ms: u64,
}

impl LimiterConfig {
    /// Get the acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Build the token bucket configuration
    pub fn token_bucket(&self) -> TokenBucketConfig {
        TokenBucketConfig {
            capacity: self.capacity,
            refill_rate_per_sec: self.refill_rate_per_sec,
            acquire_timeout: self.acquire_timeout(),
        }
    }

    /// Validate limiter configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.capacity <= 0.0 || self.refill_rate_per_sec <= 0.0 {
            return Err(ValidationError::InvalidLimiterRate);
        }
        if self.acquire_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_rate_per_sec: default_refill_rate(),
            acquire_timeout_ms: default_acquire_timeout(),
        }
    }
}

fn default_capacity() -> f64 {
    25.0
}

fn default_refill_rate() -> f64 {
    25.0
}

fn default_acquire_timeout() -> u64 {
    1_000
}
