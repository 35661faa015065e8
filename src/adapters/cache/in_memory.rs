//! In-memory verification cache for testing and single-process deployments.
//!
//! Entries expire lazily: a lookup past the deadline behaves as a miss and
//! removes the entry. Nothing sweeps the map in the background, so callers
//! that care about memory growth can invoke `purge_expired` themselves.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::foundation::{ChannelId, Timestamp, UserId};
use crate::domain::verification::MembershipFact;
use crate::ports::{CacheError, Clock, VerificationCache};

/// In-memory cache keyed by (user, channel).
pub struct InMemoryVerificationCache {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<(UserId, ChannelId), CacheEntry>>,
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    fact: MembershipFact,
    expires_at: Timestamp,
}

impl InMemoryVerificationCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored, including not-yet-purged
    /// expired ones.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Removes every expired entry. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.is_before(&entry.expires_at));
        before - entries.len()
    }
}

impl std::fmt::Debug for InMemoryVerificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVerificationCache")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VerificationCache for InMemoryVerificationCache {
    async fn get(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<Option<MembershipFact>, CacheError> {
        let key = (user_id, channel_id);
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if now.is_before(&entry.expires_at) => {
                    return Ok(Some(entry.fact.via_cache()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Entry exists but is stale: drop it under the write lock.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(&key) {
            if !now.is_before(&entry.expires_at) {
                entries.remove(&key);
            }
        }
        Ok(None)
    }

    async fn put(&self, fact: MembershipFact, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = self.clock.now().plus_duration(ttl);
        let key = (fact.user_id, fact.channel_id);
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { fact, expires_at });
        Ok(())
    }

    async fn invalidate(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.remove(&(user_id, channel_id));
        Ok(())
    }
}
