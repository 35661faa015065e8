//! VerificationCache port - cache-aside storage for membership facts.
//!
//! The orchestrator consults this cache before every membership API call
//! and writes fresh facts back after a miss (classic cache-aside).
//! Implementations can use in-memory storage or Redis when the cache must
//! be shared between processes.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::{ChannelId, UserId};
use crate::domain::verification::MembershipFact;

/// Port for the (user, channel) → membership fact cache.
#[async_trait]
pub trait VerificationCache: Send + Sync {
    /// Look up the cached fact for a key, if any entry is still live.
    ///
    /// Returned facts carry `FactSource::Cache`.
    async fn get(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<Option<MembershipFact>, CacheError>;

    /// Store a fact under its key, overwriting any existing entry.
    ///
    /// The TTL is decided by the caller's `CachePolicy`; the cache itself
    /// applies no policy of its own.
    async fn put(&self, fact: MembershipFact, ttl: Duration) -> Result<(), CacheError>;

    /// Drop the entry for a key so the next check bypasses the cache.
    ///
    /// Used when an out-of-band membership-change event arrives. Removing
    /// a key that is absent is not an error.
    async fn invalidate(&self, user_id: UserId, channel_id: ChannelId)
        -> Result<(), CacheError>;
}

/// Errors from cache operations.
///
/// Callers treat any of these as a cache miss: a broken cache degrades
/// performance, never correctness.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Cache backend is unavailable.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("cache serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_error_displays_backend_message() {
        let err = CacheError::Unavailable("connection refused".into());
        assert_eq!(err.to_string(), "cache unavailable: connection refused");
    }
}
