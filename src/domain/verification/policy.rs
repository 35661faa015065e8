//! Cache TTL policy with asymmetric lifetimes and expiry jitter.

use rand::Rng;
use std::time::Duration;

use crate::domain::foundation::ValidationError;

/// Decides how long a membership fact may live in the cache.
///
/// Negative results expire much sooner than positive ones: a non-member can
/// join at any moment, while existing membership is comparatively stable.
/// Every TTL carries a random jitter so entries written in the same burst
/// do not expire in the same burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachePolicy {
    positive_ttl: Duration,
    negative_ttl: Duration,
    jitter_pct: f64,
}

impl CachePolicy {
    /// Creates a policy, enforcing the TTL asymmetry invariant.
    ///
    /// Rejects configurations where a jittered negative TTL could reach or
    /// exceed a jittered positive TTL, since downstream logic relies on
    /// negative entries always expiring first.
    pub fn new(
        positive_ttl: Duration,
        negative_ttl: Duration,
        jitter_pct: f64,
    ) -> Result<Self, ValidationError> {
        if positive_ttl.is_zero() {
            return Err(ValidationError::empty_field("positive_ttl"));
        }
        if negative_ttl.is_zero() {
            return Err(ValidationError::empty_field("negative_ttl"));
        }
        if !(0.0..0.5).contains(&jitter_pct) {
            return Err(ValidationError::invalid_format(
                "jitter_pct",
                "must be in [0.0, 0.5)",
            ));
        }
        let negative_max = negative_ttl.as_secs_f64() * (1.0 + jitter_pct);
        let positive_min = positive_ttl.as_secs_f64() * (1.0 - jitter_pct);
        if negative_max >= positive_min {
            return Err(ValidationError::invalid_format(
                "negative_ttl",
                "jittered negative TTL must stay below jittered positive TTL",
            ));
        }
        Ok(Self {
            positive_ttl,
            negative_ttl,
            jitter_pct,
        })
    }

    /// Returns the TTL to use for a fact with the given membership value,
    /// with jitter applied.
    pub fn ttl_for(&self, is_member: bool) -> Duration {
        let base = if is_member {
            self.positive_ttl
        } else {
            self.negative_ttl
        };
        self.apply_jitter(base)
    }

    /// Base TTL for positive results, before jitter.
    pub fn positive_ttl(&self) -> Duration {
        self.positive_ttl
    }

    /// Base TTL for negative results, before jitter.
    pub fn negative_ttl(&self) -> Duration {
        self.negative_ttl
    }

    fn apply_jitter(&self, base: Duration) -> Duration {
        if self.jitter_pct == 0.0 {
            return base;
        }
        let mut rng = rand::thread_rng();
        let factor = rng.gen_range(1.0 - self.jitter_pct..=1.0 + self.jitter_pct);
        base.mul_f64(factor)
    }
}

impl Default for CachePolicy {
    /// Ten minutes for members, one minute for non-members, ±10% jitter.
    fn default() -> Self {
        Self {
            positive_ttl: Duration::from_secs(600),
            negative_ttl: Duration::from_secs(60),
            jitter_pct: 0.10,
        }
    }
}
