//! Rolling-window circuit breaker.
//!
//! Counts failures inside a sliding time window rather than over the
//! breaker's whole lifetime, so a slow trickle of errors spread across
//! hours never trips the circuit. While open, all calls are rejected
//! until the reset timeout elapses; the first caller after that is
//! admitted as a single trial and everyone else keeps getting rejected
//! until the trial reports back. Repeated failed trials grow the reset
//! timeout geometrically up to a cap.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState, Clock,
};

/// Circuit breaker with a sliding failure window and single-trial recovery.
pub struct RollingWindowBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerInner>,
}

struct BreakerInner {
    state: CircuitState,
    /// Failure instants still inside the rolling window, oldest first.
    failures: VecDeque<Timestamp>,
    /// Set whenever the breaker transitions to open.
    opened_at: Option<Timestamp>,
    /// Grows by `reset_backoff_factor` each time a recovery trial fails.
    current_reset_timeout: Duration,
    /// True while a half-open trial call is in flight.
    trial_in_flight: bool,
    total_successes: u64,
    total_failures: u64,
    rejected_calls: u64,
    times_opened: u64,
}

impl RollingWindowBreaker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(CircuitBreakerConfig::default(), clock)
    }

    pub fn with_config(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        let inner = BreakerInner {
            state: CircuitState::Closed,
            failures: VecDeque::new(),
            opened_at: None,
            current_reset_timeout: config.reset_timeout,
            trial_in_flight: false,
            total_successes: 0,
            total_failures: 0,
            rejected_calls: 0,
            times_opened: 0,
        };
        Self {
            config,
            clock,
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner
            .lock()
            .expect("circuit breaker lock poisoned - a thread panicked while holding it")
    }

    /// Drops failure timestamps that have aged out of the window.
    fn expire_window(&self, inner: &mut BreakerInner, now: Timestamp) {
        while let Some(oldest) = inner.failures.front() {
            if now.saturating_duration_since(oldest) > self.config.failure_window {
                inner.failures.pop_front();
            } else {
                break;
            }
        }
    }

    fn open(&self, inner: &mut BreakerInner, now: Timestamp, reset_timeout: Duration) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(now);
        inner.current_reset_timeout = reset_timeout;
        inner.trial_in_flight = false;
        inner.failures.clear();
        inner.times_opened += 1;
        tracing::warn!(
            "Circuit breaker opened, rejecting calls for {:?}",
            reset_timeout
        );
    }

    /// Reset timeout after a failed trial: grow geometrically, capped.
    fn grown_reset_timeout(&self, current: Duration) -> Duration {
        current
            .mul_f64(self.config.reset_backoff_factor)
            .min(self.config.max_reset_timeout)
    }
}

impl std::fmt::Debug for RollingWindowBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("RollingWindowBreaker")
            .field("state", &inner.state)
            .field("current_failures", &inner.failures.len())
            .field("current_reset_timeout", &inner.current_reset_timeout)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker for RollingWindowBreaker {
    fn state(&self) -> CircuitState {
        self.lock().state
    }

    fn should_allow(&self) -> bool {
        let mut inner = self.lock();
        let now = self.clock.now();

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let since_opened = inner
                    .opened_at
                    .map(|opened| now.saturating_duration_since(&opened))
                    .unwrap_or(Duration::ZERO);
                if since_opened >= inner.current_reset_timeout {
                    // Reset timeout elapsed: this caller becomes the trial.
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    tracing::info!("Circuit breaker half-open, admitting trial call");
                    true
                } else {
                    inner.rejected_calls += 1;
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    inner.rejected_calls += 1;
                    false
                } else {
                    inner.trial_in_flight = true;
                    true
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        inner.total_successes += 1;

        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.failures.clear();
                inner.opened_at = None;
                inner.trial_in_flight = false;
                inner.current_reset_timeout = self.config.reset_timeout;
                tracing::info!("Circuit breaker closed after successful trial");
            }
            CircuitState::Closed => {
                // A success clears the failure streak.
                inner.failures.clear();
            }
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        let now = self.clock.now();
        inner.total_failures += 1;

        match inner.state {
            CircuitState::HalfOpen => {
                // Failed trial: reopen with a longer reset timeout.
                let grown = self.grown_reset_timeout(inner.current_reset_timeout);
                self.open(&mut inner, now, grown);
            }
            CircuitState::Closed => {
                inner.failures.push_back(now);
                self.expire_window(&mut inner, now);
                if inner.failures.len() as u32 >= self.config.failure_threshold {
                    let base = self.config.reset_timeout;
                    self.open(&mut inner, now, base);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn reset(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failures.clear();
        inner.opened_at = None;
        inner.trial_in_flight = false;
        inner.current_reset_timeout = self.config.reset_timeout;
        tracing::info!("Circuit breaker manually reset to closed");
    }

    fn metrics(&self) -> CircuitBreakerMetrics {
        let mut inner = self.lock();
        let now = self.clock.now();
        self.expire_window(&mut inner, now);

        let time_until_half_open = match inner.state {
            CircuitState::Open => inner.opened_at.map(|opened| {
                inner
                    .current_reset_timeout
                    .saturating_sub(now.saturating_duration_since(&opened))
            }),
            _ => None,
        };

        CircuitBreakerMetrics {
            state: inner.state,
            total_successes: inner.total_successes,
            total_failures: inner.total_failures,
            rejected_calls: inner.rejected_calls,
            times_opened: inner.times_opened,
            current_failures: inner.failures.len() as u32,
            time_until_half_open,
        }
    }
}
