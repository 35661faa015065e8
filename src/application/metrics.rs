//! Engine counters.
//!
//! Cheap atomic counters the orchestrator and enforcement engine bump as
//! they work. Embedders read a consistent-enough view via `snapshot`;
//! nothing here talks to an external metrics system.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::domain::enforcement::EnforcementOutcome;
use crate::domain::verification::Verdict;

/// Counters covering the verification and enforcement paths.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    verdicts_satisfied: AtomicU64,
    verdicts_unsatisfied: AtomicU64,
    verdicts_degraded: AtomicU64,
    admin_bypasses: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    api_calls: AtomicU64,
    api_failures: AtomicU64,
    breaker_rejections: AtomicU64,
    limiter_timeouts: AtomicU64,
    limiter_wait_ms: AtomicU64,
    restrictions_applied: AtomicU64,
    restrictions_lifted: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub verdicts_satisfied: u64,
    pub verdicts_unsatisfied: u64,
    pub verdicts_degraded: u64,
    pub admin_bypasses: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub api_calls: u64,
    pub api_failures: u64,
    pub breaker_rejections: u64,
    pub limiter_timeouts: u64,
    /// Total time spent waiting for rate-limit tokens, in milliseconds.
    pub limiter_wait_ms: u64,
    pub restrictions_applied: u64,
    pub restrictions_lifted: u64,
}

impl MetricsSnapshot {
    /// Cache hits as a share of all cache lookups, if any happened.
    pub fn cache_hit_rate(&self) -> Option<f64> {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            return None;
        }
        Some(self.cache_hits as f64 / lookups as f64)
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_verdict(&self, verdict: Verdict) {
        let counter = match verdict {
            Verdict::Satisfied => &self.verdicts_satisfied,
            Verdict::Unsatisfied => &self.verdicts_unsatisfied,
            Verdict::Degraded => &self.verdicts_degraded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admin_bypass(&self) {
        self.admin_bypasses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one membership API call and whether it ultimately failed.
    pub fn record_api_call(&self, succeeded: bool) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.api_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count one call rejected by the open circuit breaker.
    pub fn record_breaker_rejection(&self) {
        self.breaker_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one check abandoned while waiting for a rate-limit token.
    pub fn record_limiter_timeout(&self) {
        self.limiter_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Accumulate time spent waiting for a rate-limit token.
    pub fn record_limiter_wait(&self, waited: Duration) {
        if !waited.is_zero() {
            self.limiter_wait_ms
                .fetch_add(waited.as_millis() as u64, Ordering::Relaxed);
        }
    }

    pub fn record_enforcement(&self, outcome: EnforcementOutcome) {
        match outcome {
            EnforcementOutcome::Restricted => {
                self.restrictions_applied.fetch_add(1, Ordering::Relaxed);
            }
            EnforcementOutcome::Lifted => {
                self.restrictions_lifted.fetch_add(1, Ordering::Relaxed);
            }
            EnforcementOutcome::AlreadyRestricted | EnforcementOutcome::Noop => {}
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            verdicts_satisfied: self.verdicts_satisfied.load(Ordering::Relaxed),
            verdicts_unsatisfied: self.verdicts_unsatisfied.load(Ordering::Relaxed),
            verdicts_degraded: self.verdicts_degraded.load(Ordering::Relaxed),
            admin_bypasses: self.admin_bypasses.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
            api_failures: self.api_failures.load(Ordering::Relaxed),
            breaker_rejections: self.breaker_rejections.load(Ordering::Relaxed),
            limiter_timeouts: self.limiter_timeouts.load(Ordering::Relaxed),
            limiter_wait_ms: self.limiter_wait_ms.load(Ordering::Relaxed),
            restrictions_applied: self.restrictions_applied.load(Ordering::Relaxed),
            restrictions_lifted: self.restrictions_lifted.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_land_in_their_own_counters() {
        let metrics = EngineMetrics::new();

        metrics.record_verdict(Verdict::Satisfied);
        metrics.record_verdict(Verdict::Satisfied);
        metrics.record_verdict(Verdict::Unsatisfied);
        metrics.record_verdict(Verdict::Degraded);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.verdicts_satisfied, 2);
        assert_eq!(snapshot.verdicts_unsatisfied, 1);
        assert_eq!(snapshot.verdicts_degraded, 1);
    }

    #[test]
    fn cache_hit_rate_reflects_lookups() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.snapshot().cache_hit_rate(), None);

        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        let rate = metrics.snapshot().cache_hit_rate().unwrap();
        assert!((rate - 0.75).abs() < 1e-9);
    }

    #[test]
    fn only_state_changes_count_as_enforcement() {
        let metrics = EngineMetrics::new();

        metrics.record_enforcement(EnforcementOutcome::Restricted);
        metrics.record_enforcement(EnforcementOutcome::AlreadyRestricted);
        metrics.record_enforcement(EnforcementOutcome::Lifted);
        metrics.record_enforcement(EnforcementOutcome::Noop);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.restrictions_applied, 1);
        assert_eq!(snapshot.restrictions_lifted, 1);
    }

    #[test]
    fn limiter_wait_accumulates_across_checks() {
        let metrics = EngineMetrics::new();

        metrics.record_limiter_wait(Duration::ZERO);
        metrics.record_limiter_wait(Duration::from_millis(40));
        metrics.record_limiter_wait(Duration::from_millis(25));
        metrics.record_limiter_timeout();
        metrics.record_breaker_rejection();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.limiter_wait_ms, 65);
        assert_eq!(snapshot.limiter_timeouts, 1);
        assert_eq!(snapshot.breaker_rejections, 1);
    }

    #[test]
    fn api_failures_are_a_subset_of_calls() {
        let metrics = EngineMetrics::new();

        metrics.record_api_call(true);
        metrics.record_api_call(false);
        metrics.record_api_call(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.api_calls, 3);
        assert_eq!(snapshot.api_failures, 1);
    }
}
