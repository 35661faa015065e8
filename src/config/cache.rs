//! Verification cache configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::verification::CachePolicy;

use super::error::ValidationError;

/// Verification cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// How long confirmed membership stays cached, in seconds
    #[serde(default = "default_positive_ttl")]
    pub positive_ttl_secs: u64,

    /// How long confirmed non-membership stays cached, in seconds
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl_secs: u64,

    /// Random TTL jitter as a fraction, e.g. 0.10 for ±10%
    #[serde(default = "default_jitter")]
    pub jitter_pct: f64,

    /// Redis URL for a shared cache; in-process cache when unset
    pub redis_url: Option<String>,
}

impl CacheConfig {
    /// Build the TTL policy, enforcing the asymmetry invariant
    pub fn policy(&self) -> Result<CachePolicy, ValidationError> {
        if !(0.0..0.5).contains(&self.jitter_pct) {
            return Err(ValidationError::InvalidJitter);
        }
        CachePolicy::new(
            Duration::from_secs(self.positive_ttl_secs),
            Duration::from_secs(self.negative_ttl_secs),
            self.jitter_pct,
        )
        .map_err(|_| ValidationError::InvalidCacheTtls)
    }

    /// Validate cache configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.policy()?;
        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ValidationError::InvalidRedisUrl);
            }
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            positive_ttl_secs: default_positive_ttl(),
            negative_ttl_secs: default_negative_ttl(),
            jitter_pct: default_jitter(),
            redis_url: None,
        }
    }
}

fn default_positive_ttl() -> u64 {
    600
}

fn default_negative_ttl() -> u64 {
    60
}

fn default_jitter() -> f64 {
    0.10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.positive_ttl_secs, 600);
        assert_eq!(config.negative_ttl_secs, 60);
        assert!((config.jitter_pct - 0.10).abs() < 1e-9);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_default_policy_is_valid() {
        assert!(CacheConfig::default().policy().is_ok());
    }

    #[test]
    fn test_validation_rejects_overlapping_ttls() {
        let config = CacheConfig {
            positive_ttl_secs: 100,
            negative_ttl_secs: 95,
            jitter_pct: 0.10,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCacheTtls)
        ));
    }

    #[test]
    fn test_validation_rejects_excessive_jitter() {
        let config = CacheConfig {
            jitter_pct: 0.75,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidJitter)
        ));
    }

    #[test]
    fn test_validation_invalid_redis_url() {
        let config = CacheConfig {
            redis_url: Some("http://localhost:6379".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRedisUrl)
        ));
    }

    #[test]
    fn test_validation_valid_redis_url() {
        let config = CacheConfig {
            redis_url: Some("redis://localhost:6379".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
