//! Token bucket rate limiter for outbound API calls.
//!
//! Tokens refill lazily: each operation computes how much time has passed
//! since the last refill and credits the bucket accordingly, so no timer
//! task runs in the background. A server-mandated backoff suspends grants
//! outright until its expiry, no matter how many tokens have accumulated.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::ports::{Clock, LimiterPermit, LimiterSnapshot, RateLimitError, RateLimiter};

use super::config::TokenBucketConfig;

/// Shortest sleep between token polls, so near-zero waits don't spin.
const MIN_POLL: Duration = Duration::from_millis(1);

/// Token bucket limiter shared by all outbound callers.
pub struct TokenBucketLimiter {
    config: TokenBucketConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Timestamp,
    /// End of a server-mandated suspension, if one is active.
    suspended_until: Option<Timestamp>,
}

impl TokenBucketLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(TokenBucketConfig::default(), clock)
    }

    pub fn with_config(config: TokenBucketConfig, clock: Arc<dyn Clock>) -> Self {
        let state = BucketState {
            tokens: config.capacity,
            last_refill: clock.now(),
            suspended_until: None,
        };
        Self {
            config,
            clock,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state
            .lock()
            .expect("token bucket lock poisoned - a thread panicked while holding it")
    }

    /// Credits tokens for the time elapsed since the last refill.
    fn refill(&self, state: &mut BucketState, now: Timestamp) {
        let elapsed = now.saturating_duration_since(&state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.config.refill_rate_per_sec)
            .min(self.config.capacity);
        state.last_refill = now;
    }

    /// Tries to take a token. Returns how long to wait before the next try
    /// when none is available.
    fn try_take(&self) -> Result<(), Duration> {
        let mut state = self.lock();
        let now = self.clock.now();
        self.refill(&mut state, now);

        // Suspension blocks grants even when tokens are available.
        if let Some(until) = state.suspended_until {
            if now.is_before(&until) {
                return Err(until.saturating_duration_since(&now));
            }
            state.suspended_until = None;
        }

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - state.tokens;
            Err(Duration::from_secs_f64(
                deficit / self.config.refill_rate_per_sec,
            ))
        }
    }
}

impl std::fmt::Debug for TokenBucketLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TokenBucketLimiter")
            .field("tokens", &state.tokens)
            .field("capacity", &self.config.capacity)
            .field("suspended", &state.suspended_until.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RateLimiter for TokenBucketLimiter {
    async fn acquire(&self) -> Result<LimiterPermit, RateLimitError> {
        let mut waited = Duration::ZERO;

        loop {
            let wait = match self.try_take() {
                Ok(()) => return Ok(LimiterPermit { waited }),
                Err(wait) => wait,
            };

            let remaining = self.config.acquire_timeout.saturating_sub(waited);
            if remaining.is_zero() {
                return Err(RateLimitError::Timeout { waited });
            }
            let chunk = wait.clamp(MIN_POLL, remaining);
            tokio::time::sleep(chunk).await;
            waited += chunk;
        }
    }

    fn apply_server_backoff(&self, wait: Duration) {
        let mut state = self.lock();
        let until = self.clock.now().plus_duration(wait);
        // Overlapping backoffs keep whichever expires last.
        let extended = match state.suspended_until {
            Some(existing) if existing.is_after(&until) => existing,
            _ => until,
        };
        state.suspended_until = Some(extended);
        tracing::warn!(
            "Server requested backoff, suspending outbound calls for {:?}",
            wait
        );
    }

    fn snapshot(&self) -> LimiterSnapshot {
        let mut state = self.lock();
        let now = self.clock.now();
        self.refill(&mut state, now);
        LimiterSnapshot {
            tokens: state.tokens,
            capacity: self.config.capacity,
            refill_rate_per_sec: self.config.refill_rate_per_sec,
            suspended_until: state.suspended_until,
        }
    }
}
