//! Verification pass configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::VerificationConfig;
use crate::domain::verification::CachePolicy;

use super::error::ValidationError;

/// Verification pass configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChecksConfig {
    /// Channels checked in parallel per request
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Hard ceiling on one verification pass, in milliseconds
    #[serde(default = "default_request_deadline")]
    pub request_deadline_ms: u64,
}

impl ChecksConfig {
    /// Get the request deadline as Duration
    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    /// Build the orchestrator configuration with the given TTL policy
    pub fn verification_config(&self, cache_policy: CachePolicy) -> VerificationConfig {
        VerificationConfig {
            max_concurrent_checks: self.max_concurrent,
            request_deadline: self.request_deadline(),
            cache_policy,
        }
    }

    /// Validate verification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent == 0 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.request_deadline_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            request_deadline_ms: default_request_deadline(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}

fn default_request_deadline() -> u64 {
    2_500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks_config_defaults() {
        let config = ChecksConfig::default();
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.request_deadline(), Duration::from_millis(2_500));
    }

    #[test]
    fn test_validation_rejects_zero_concurrency() {
        let config = ChecksConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidConcurrency)
        ));
    }

    #[test]
    fn test_verification_config_conversion() {
        let config = ChecksConfig {
            max_concurrent: 8,
            request_deadline_ms: 1_000,
        };
        let built = config.verification_config(CachePolicy::default());
        assert_eq!(built.max_concurrent_checks, 8);
        assert_eq!(built.request_deadline, Duration::from_secs(1));
    }
}
