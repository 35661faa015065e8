//! CircuitBreaker port - Interface for external service resilience.
//!
//! The circuit breaker pattern prevents cascading failures when the
//! membership API becomes unavailable or slow.
//!
//! ## States
//!
//! - **Closed**: Normal operation, requests flow through
//! - **Open**: Too many failures, requests rejected immediately
//! - **Half-Open**: Testing if the service recovered, one trial allowed
//!
//! ## Transitions
//!
//! ```text
//! Closed --[failure_threshold within failure_window]--> Open
//! Open --[reset_timeout elapsed]--> Half-Open
//! Half-Open --[trial succeeds]--> Closed
//! Half-Open --[trial fails]--> Open (reset_timeout grows, capped)
//! ```

use std::time::Duration;

/// Circuit breaker states for external service protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests flow through to the service.
    Closed,

    /// Too many failures - requests rejected immediately without calling
    /// the service. The circuit transitions to HalfOpen after reset_timeout.
    Open,

    /// Testing if the service recovered - a single trial request allowed.
    /// Success → Closed, failure → Open.
    HalfOpen,
}

impl CircuitState {
    /// Check if the circuit allows requests through.
    pub fn allows_requests(&self) -> bool {
        matches!(self, CircuitState::Closed | CircuitState::HalfOpen)
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of failures within the window before opening the circuit.
    ///
    /// Default: 5 failures
    pub failure_threshold: u32,

    /// Rolling window within which failures count toward the threshold.
    ///
    /// Default: 60 seconds
    pub failure_window: Duration,

    /// Time to wait in Open before admitting a half-open trial.
    ///
    /// Default: 30 seconds
    pub reset_timeout: Duration,

    /// Growth factor applied to reset_timeout on a failed trial.
    ///
    /// 1.0 keeps the timeout constant. Default: 2.0
    pub reset_backoff_factor: f64,

    /// Upper bound for the grown reset timeout.
    ///
    /// Default: 300 seconds
    pub max_reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            reset_timeout: Duration::from_secs(30),
            reset_backoff_factor: 2.0,
            max_reset_timeout: Duration::from_secs(300),
        }
    }
}

impl CircuitBreakerConfig {
    /// Config tuned for the membership API: trip fast, probe patiently.
    pub fn for_membership_api() -> Self {
        Self {
            failure_threshold: 3,
            failure_window: Duration::from_secs(30),
            reset_timeout: Duration::from_secs(30),
            reset_backoff_factor: 2.0,
            max_reset_timeout: Duration::from_secs(240),
        }
    }
}

/// Port for circuit breaker functionality.
///
/// Protects against cascading failures when the membership API becomes
/// unavailable.
///
/// # Example
///
/// ```ignore
/// if !breaker.should_allow() {
///     return Err(CheckError::ServiceUnavailable);
/// }
/// match api.member_status(channel_id, user_id).await {
///     Ok(status) => {
///         breaker.record_success();
///         Ok(status)
///     }
///     Err(e) if e.is_transient() => {
///         breaker.record_failure();
///         Err(e.into())
///     }
///     Err(e) => Err(e.into()), // permanent errors don't count
/// }
/// ```
pub trait CircuitBreaker: Send + Sync {
    /// Get the current state of the circuit.
    fn state(&self) -> CircuitState;

    /// Check if a request should be allowed through.
    ///
    /// Returns `true` if the circuit is closed, or if this caller won the
    /// single half-open trial slot. Returns `false` if the circuit is open
    /// or another trial is already in flight.
    ///
    /// A `true` in half-open reserves the trial: the caller must follow up
    /// with `record_success` or `record_failure`.
    fn should_allow(&self) -> bool;

    /// Record a successful request.
    ///
    /// In half-open state, this closes the circuit and restores the base
    /// reset timeout. In closed state, it clears the failure window.
    fn record_success(&self);

    /// Record a failed request.
    ///
    /// In closed state, this counts toward the failure threshold.
    /// In half-open state, this immediately reopens the circuit.
    fn record_failure(&self);

    /// Force reset the circuit to closed state.
    ///
    /// Use sparingly - typically for administrative intervention.
    fn reset(&self);

    /// Get metrics about the circuit breaker.
    fn metrics(&self) -> CircuitBreakerMetrics;
}

/// Metrics about circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    /// Current state
    pub state: CircuitState,

    /// Total successful requests since creation
    pub total_successes: u64,

    /// Total failed requests since creation
    pub total_failures: u64,

    /// Calls rejected without a network attempt
    pub rejected_calls: u64,

    /// Times the circuit has opened
    pub times_opened: u64,

    /// Failures currently inside the rolling window
    pub current_failures: u32,

    /// Time until the circuit admits a trial (when open)
    pub time_until_half_open: Option<Duration>,
}
