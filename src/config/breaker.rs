//! Circuit breaker configuration

use serde::Deserialize;
use std::time::Duration;

use crate::ports::CircuitBreakerConfig;

use super::error::ValidationError;

/// Membership API circuit breaker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerConfig {
    /// Failures inside the window that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Rolling window over which failures are counted, in seconds
    #[serde(default = "default_failure_window")]
    pub failure_window_secs: u64,

    /// Wait before the first recovery trial, in seconds
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout_secs: u64,

    /// Growth factor applied to the reset timeout after a failed trial
    #[serde(default = "default_backoff_factor")]
    pub reset_backoff_factor: f64,

    /// Ceiling for the grown reset timeout, in seconds
    #[serde(default = "default_max_reset_timeout")]
    pub max_reset_timeout_secs: u64,
}

impl BreakerConfig {
    /// Build the circuit breaker configuration
    pub fn circuit_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            failure_window: Duration::from_secs(self.failure_window_secs),
            reset_timeout: Duration::from_secs(self.reset_timeout_secs),
            reset_backoff_factor: self.reset_backoff_factor,
            max_reset_timeout: Duration::from_secs(self.max_reset_timeout_secs),
        }
    }

    /// Validate breaker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.failure_threshold == 0 {
            return Err(ValidationError::InvalidBreakerThreshold);
        }
        if self.failure_window_secs == 0 || self.reset_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.reset_backoff_factor < 1.0
            || self.max_reset_timeout_secs < self.reset_timeout_secs
        {
            return Err(ValidationError::InvalidBreakerBackoff);
        }
        Ok(())
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            failure_window_secs: default_failure_window(),
            reset_timeout_secs: default_reset_timeout(),
            reset_backoff_factor: default_backoff_factor(),
            max_reset_timeout_secs: default_max_reset_timeout(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_failure_window() -> u64 {
    30
}

fn default_reset_timeout() -> u64 {
    30
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_reset_timeout() -> u64 {
    240
}
