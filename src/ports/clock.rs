//! Clock port for obtaining current time.
//!
//! Refill math, TTL expiry, and breaker windows all flow through this
//! seam so tests can drive time deterministically. Infrastructure
//! provides SystemClock and ManualClock.

use std::fmt::Debug;

use crate::domain::foundation::Timestamp;

/// Port for obtaining the current time.
pub trait Clock: Send + Sync + Debug {
    /// Get the current moment.
    fn now(&self) -> Timestamp;
}
