//! Token bucket configuration.

use std::time::Duration;

/// Tuning knobs for the outbound token bucket.
///
/// Defaults pace calls at 25 per second with a burst of 25, staying under
/// the bot API's documented ceiling of roughly 30 calls per second.
#[derive(Debug, Clone)]
pub struct TokenBucketConfig {
    /// Maximum tokens the bucket holds; also the burst size.
    pub capacity: f64,

    /// Tokens added per second.
    pub refill_rate_per_sec: f64,

    /// How long `acquire` waits for a token before giving up.
    pub acquire_timeout: Duration,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self {
            capacity: 25.0,
            refill_rate_per_sec: 25.0,
            acquire_timeout: Duration::from_secs(1),
        }
    }
}
