//! MembershipClient - resilient wrapper around the membership API.
//!
//! Every check runs the same pipeline: take a rate-limit token, ask the
//! circuit breaker for admission, make the call, then classify the result.
//! Transient failures retry with exponential backoff and count against the
//! breaker; a throttle response suspends the rate limiter instead. Any
//! response from the service, including errors about the request itself,
//! proves availability; only transport-level failures open the circuit.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::audit::{ApiCallResult, AuditRecord};
use crate::domain::foundation::{ChannelId, EventId, Timestamp, UserId};
use crate::domain::verification::MembershipFact;
use crate::ports::{CircuitBreaker, Clock, MembershipApi, MembershipApiError, RateLimiter};

use super::audit::AuditLogger;
use super::metrics::EngineMetrics;

/// Retry tuning for transient failures.
#[derive(Debug, Clone)]
pub struct MembershipClientConfig {
    /// Total attempts per check, including the first.
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles per further attempt.
    pub base_backoff: Duration,
}

impl Default for MembershipClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(300),
        }
    }
}

/// Why a check could not produce a membership fact.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The circuit breaker is rejecting calls.
    #[error("membership service unavailable (circuit open)")]
    ServiceUnavailable,

    /// Local pacing or a server throttle blocked the call.
    #[error("membership check rate limited")]
    RateLimited,

    /// The API failed after exhausting its attempts.
    #[error("membership check failed: {0}")]
    Upstream(#[from] MembershipApiError),
}

/// Membership API client with pacing, circuit breaking and retries.
pub struct MembershipClient {
    api: Arc<dyn MembershipApi>,
    limiter: Arc<dyn RateLimiter>,
    breaker: Arc<dyn CircuitBreaker>,
    clock: Arc<dyn Clock>,
    audit: AuditLogger,
    metrics: Arc<EngineMetrics>,
    config: MembershipClientConfig,
}

impl MembershipClient {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Arc<dyn MembershipApi>,
        limiter: Arc<dyn RateLimiter>,
        breaker: Arc<dyn CircuitBreaker>,
        clock: Arc<dyn Clock>,
        audit: AuditLogger,
        metrics: Arc<EngineMetrics>,
        config: MembershipClientConfig,
    ) -> Self {
        Self {
            api,
            limiter,
            breaker,
            clock,
            audit,
            metrics,
            config,
        }
    }

    /// Resolve a membership fact for one (channel, user) pair.
    ///
    /// The returned fact is API-sourced; caching it is the caller's job.
    pub async fn check(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<MembershipFact, CheckError> {
        let started = self.clock.now();

        match self.limiter.acquire().await {
            Ok(permit) => self.metrics.record_limiter_wait(permit.waited),
            Err(e) => {
                self.metrics.record_limiter_timeout();
                tracing::warn!(
                    "No rate limit token for membership check of user {} in channel {}: {}",
                    user_id,
                    channel_id,
                    e
                );
                return Err(CheckError::RateLimited);
            }
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            if !self.breaker.should_allow() {
                self.metrics.record_breaker_rejection();
                return Err(CheckError::ServiceUnavailable);
            }

            match self.api.member_status(channel_id, user_id).await {
                Ok(status) => {
                    self.breaker.record_success();
                    self.metrics.record_api_call(true);
                    let checked_at = self.clock.now();
                    self.audit_check(
                        user_id,
                        channel_id,
                        ApiCallResult::Resolved {
                            is_member: status.is_member(),
                        },
                        attempt,
                        started,
                    );
                    return Ok(MembershipFact::from_api(
                        user_id,
                        channel_id,
                        status.is_member(),
                        checked_at,
                    ));
                }

                Err(MembershipApiError::Throttled { retry_after }) => {
                    // The server answered, so availability is fine; it just
                    // wants us slower.
                    self.breaker.record_success();
                    self.metrics.record_api_call(false);
                    self.limiter.apply_server_backoff(retry_after);
                    self.audit_failure(user_id, channel_id, "throttled by server", attempt, started);
                    return Err(CheckError::RateLimited);
                }

                Err(e) if e.is_transient() => {
                    self.breaker.record_failure();
                    if attempt >= self.config.max_attempts {
                        self.metrics.record_api_call(false);
                        self.audit_failure(user_id, channel_id, &e.to_string(), attempt, started);
                        return Err(CheckError::Upstream(e));
                    }
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        "Membership check attempt {}/{} failed for channel {}: {}",
                        attempt,
                        self.config.max_attempts,
                        channel_id,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }

                Err(e) => {
                    // Request-level rejection: the service is up, the check
                    // simply cannot succeed. No retry, no breaker penalty.
                    self.breaker.record_success();
                    self.metrics.record_api_call(false);
                    self.audit_failure(user_id, channel_id, &e.to_string(), attempt, started);
                    return Err(CheckError::Upstream(e));
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.config.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    fn audit_check(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        outcome: ApiCallResult,
        attempts: u32,
        started: Timestamp,
    ) {
        let now = self.clock.now();
        self.audit.log(AuditRecord::MembershipChecked {
            event_id: EventId::new(),
            user_id,
            channel_id,
            outcome,
            attempts,
            latency_ms: now.saturating_duration_since(&started).as_millis() as u64,
            occurred_at: now,
        });
    }

    fn audit_failure(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        error: &str,
        attempts: u32,
        started: Timestamp,
    ) {
        self.audit_check(
            user_id,
            channel_id,
            ApiCallResult::Failed {
                error: error.to_string(),
            },
            attempts,
            started,
        );
    }
}

impl std::fmt::Debug for MembershipClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::InMemoryAuditSink;
    use crate::adapters::circuit_breaker::RollingWindowBreaker;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::rate_limiter::{TokenBucketConfig, TokenBucketLimiter};
    use crate::domain::foundation::Timestamp;
    use crate::domain::verification::{ChannelMemberStatus, FactSource};
    use crate::ports::{CircuitBreakerConfig, CircuitState, LimiterSnapshot};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::watch;

    // ===== Test Infrastructure =====

    /// Membership API that replays a scripted sequence of results.
    struct ScriptedApi {
        script: Mutex<VecDeque<Result<ChannelMemberStatus, MembershipApiError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedApi {
        fn new(
            script: Vec<Result<ChannelMemberStatus, MembershipApiError>>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl MembershipApi for ScriptedApi {
        async fn member_status(
            &self,
            _channel_id: ChannelId,
            _user_id: UserId,
        ) -> Result<ChannelMemberStatus, MembershipApiError> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(ChannelMemberStatus::Member))
        }
    }

    struct Harness {
        client: MembershipClient,
        api: Arc<ScriptedApi>,
        breaker: Arc<RollingWindowBreaker>,
        limiter: Arc<TokenBucketLimiter>,
        sink: Arc<InMemoryAuditSink>,
        metrics: Arc<EngineMetrics>,
        // Keeps the drain workers alive for the duration of the test.
        _audit_shutdown: watch::Sender<bool>,
    }

    fn harness(script: Vec<Result<ChannelMemberStatus, MembershipApiError>>) -> Harness {
        let clock = Arc::new(ManualClock::starting_at(Timestamp::from_unix_secs(
            1_700_000_000,
        )));
        let api = Arc::new(ScriptedApi::new(script));
        let limiter = Arc::new(TokenBucketLimiter::with_config(
            TokenBucketConfig {
                capacity: 100.0,
                refill_rate_per_sec: 100.0,
                acquire_timeout: Duration::from_millis(50),
            },
            clock.clone(),
        ));
        let breaker = Arc::new(RollingWindowBreaker::with_config(
            CircuitBreakerConfig {
                failure_threshold: 3,
                failure_window: Duration::from_secs(30),
                reset_timeout: Duration::from_secs(30),
                reset_backoff_factor: 2.0,
                max_reset_timeout: Duration::from_secs(300),
            },
            clock.clone(),
        ));
        let sink = Arc::new(InMemoryAuditSink::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (audit, _drain) = AuditLogger::spawn(sink.clone(), Default::default(), shutdown_rx);
        let metrics = Arc::new(EngineMetrics::new());

        let client = MembershipClient::new(
            api.clone(),
            limiter.clone(),
            breaker.clone(),
            clock,
            audit,
            metrics.clone(),
            MembershipClientConfig {
                max_attempts: 3,
                base_backoff: Duration::from_millis(5),
            },
        );

        Harness {
            client,
            api,
            breaker,
            limiter,
            sink,
            metrics,
            _audit_shutdown: shutdown_tx,
        }
    }

    fn channel() -> ChannelId {
        ChannelId::new(-1002000000001)
    }

    fn user() -> UserId {
        UserId::new(42).unwrap()
    }

    // ===== Success and Retry =====

    #[tokio::test]
    async fn successful_check_returns_api_sourced_fact() {
        let h = harness(vec![Ok(ChannelMemberStatus::Member)]);

        let fact = h.client.check(channel(), user()).await.unwrap();

        assert!(fact.is_member);
        assert_eq!(fact.source, FactSource::Api);
        assert_eq!(h.api.call_count(), 1);
        assert_eq!(h.metrics.snapshot().api_calls, 1);
    }

    #[tokio::test]
    async fn privileged_statuses_count_as_membership() {
        let h = harness(vec![Ok(ChannelMemberStatus::Creator)]);

        let fact = h.client.check(channel(), user()).await.unwrap();

        assert!(fact.is_member);
    }

    #[tokio::test]
    async fn left_status_resolves_to_non_membership() {
        let h = harness(vec![Ok(ChannelMemberStatus::Left)]);

        let fact = h.client.check(channel(), user()).await.unwrap();

        assert!(!fact.is_member);
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let h = harness(vec![
            Err(MembershipApiError::ServerError { status: 502 }),
            Err(MembershipApiError::network("connection reset")),
            Ok(ChannelMemberStatus::Member),
        ]);

        let fact = h.client.check(channel(), user()).await.unwrap();

        assert!(fact.is_member);
        assert_eq!(h.api.call_count(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_last_error() {
        let h = harness(vec![
            Err(MembershipApiError::ServerError { status: 502 }),
            Err(MembershipApiError::ServerError { status: 502 }),
            Err(MembershipApiError::ServerError { status: 503 }),
        ]);

        let err = h.client.check(channel(), user()).await.unwrap_err();

        assert!(matches!(
            err,
            CheckError::Upstream(MembershipApiError::ServerError { status: 503 })
        ));
        assert_eq!(h.api.call_count(), 3);
    }

    #[tokio::test]
    async fn permanent_errors_do_not_retry() {
        let h = harness(vec![Err(MembershipApiError::ChannelNotFound {
            channel_id: channel(),
        })]);

        let err = h.client.check(channel(), user()).await.unwrap_err();

        assert!(matches!(
            err,
            CheckError::Upstream(MembershipApiError::ChannelNotFound { .. })
        ));
        assert_eq!(h.api.call_count(), 1);
        // The service answered; the breaker holds no grudge.
        assert_eq!(h.breaker.state(), CircuitState::Closed);
    }

    // ===== Breaker Interaction =====

    #[tokio::test]
    async fn repeated_transient_failures_open_the_breaker() {
        let h = harness(vec![
            Err(MembershipApiError::ServerError { status: 502 }),
            Err(MembershipApiError::ServerError { status: 502 }),
            Err(MembershipApiError::ServerError { status: 502 }),
        ]);

        let _ = h.client.check(channel(), user()).await;

        assert_eq!(h.breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn open_breaker_rejects_without_calling_the_api() {
        let h = harness(vec![
            Err(MembershipApiError::ServerError { status: 502 }),
            Err(MembershipApiError::ServerError { status: 502 }),
            Err(MembershipApiError::ServerError { status: 502 }),
        ]);
        let _ = h.client.check(channel(), user()).await;
        assert_eq!(h.api.call_count(), 3);

        let err = h.client.check(channel(), user()).await.unwrap_err();

        assert!(matches!(err, CheckError::ServiceUnavailable));
        assert_eq!(h.api.call_count(), 3);
        assert_eq!(h.metrics.snapshot().breaker_rejections, 1);
    }

    // ===== Throttling =====

    #[tokio::test]
    async fn server_throttle_suspends_the_limiter() {
        let h = harness(vec![Err(MembershipApiError::throttled(
            Duration::from_secs(30),
        ))]);

        let err = h.client.check(channel(), user()).await.unwrap_err();

        assert!(matches!(err, CheckError::RateLimited));
        let LimiterSnapshot {
            suspended_until, ..
        } = h.limiter.snapshot();
        assert!(suspended_until.is_some());
        // Throttle is not an availability failure.
        assert_eq!(h.breaker.state(), CircuitState::Closed);
        assert_eq!(h.api.call_count(), 1);
    }

    #[tokio::test]
    async fn suspended_limiter_blocks_the_next_check() {
        let h = harness(vec![Err(MembershipApiError::throttled(
            Duration::from_secs(30),
        ))]);
        let _ = h.client.check(channel(), user()).await;

        let err = h.client.check(channel(), user()).await.unwrap_err();

        assert!(matches!(err, CheckError::RateLimited));
        assert_eq!(h.api.call_count(), 1);
    }

    // ===== Audit Trail =====

    #[tokio::test]
    async fn each_check_leaves_one_audit_record() {
        let h = harness(vec![
            Err(MembershipApiError::ServerError { status: 502 }),
            Ok(ChannelMemberStatus::Member),
        ]);

        h.client.check(channel(), user()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let records = h.sink.records().await;
        assert_eq!(records.len(), 1);
        match &records[0] {
            AuditRecord::MembershipChecked {
                outcome, attempts, ..
            } => {
                assert_eq!(*outcome, ApiCallResult::Resolved { is_member: true });
                assert_eq!(*attempts, 2);
            }
            other => panic!("expected membership check record, got {:?}", other),
        }
    }
}
