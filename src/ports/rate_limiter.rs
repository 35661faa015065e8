//! Rate limiting port for pacing outbound membership API calls.
//!
//! This port defines the interface for a token-bucket limiter that sits
//! in front of every outbound API call. Callers block in `acquire` until
//! a token is available or their acquire deadline expires; an explicit
//! server backoff signal suspends the bucket regardless of local tokens.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::Timestamp;

/// Port for rate limiting outbound calls.
///
/// Implementations must be safe to call from many concurrent tasks; every
/// waiting task observes server-applied backoff, not only the one that
/// received the throttle response.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Take one token, waiting for refill if none is available.
    ///
    /// Fails with `RateLimitError::Timeout` once the configured acquire
    /// deadline elapses without a token.
    async fn acquire(&self) -> Result<LimiterPermit, RateLimitError>;

    /// Honor a server-mandated wait before any further call.
    ///
    /// Subsequent `acquire` calls grant nothing until at least `wait` has
    /// elapsed, regardless of accumulated tokens. Overlapping backoffs
    /// keep the latest expiry.
    fn apply_server_backoff(&self, wait: Duration);

    /// Current bucket state, for observability.
    fn snapshot(&self) -> LimiterSnapshot;
}

/// Proof that a token was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterPermit {
    /// How long the caller waited for the token.
    pub waited: Duration,
}

impl LimiterPermit {
    /// A permit granted without waiting.
    pub fn immediate() -> Self {
        Self {
            waited: Duration::ZERO,
        }
    }
}

/// Point-in-time view of the bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterSnapshot {
    /// Tokens currently available.
    pub tokens: f64,
    /// Maximum tokens the bucket can hold.
    pub capacity: f64,
    /// Tokens added per second.
    pub refill_rate_per_sec: f64,
    /// End of a server-mandated suspension, if one is active.
    pub suspended_until: Option<Timestamp>,
}

/// Errors from rate limiting.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// No token became available within the acquire deadline.
    ///
    /// This is local backpressure, not an upstream fault.
    #[error("no rate limit token within {waited:?}")]
    Timeout {
        /// Time spent waiting before giving up.
        waited: Duration,
    },
}
