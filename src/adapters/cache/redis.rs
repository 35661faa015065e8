//! Redis-backed verification cache for multi-process deployments.
//!
//! Facts are stored as JSON strings under `member:{user_id}:{channel_id}`
//! with a per-entry TTL, so expiry is enforced by Redis itself and every
//! process sharing the instance sees the same membership facts.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::foundation::{ChannelId, UserId};
use crate::domain::verification::MembershipFact;
use crate::ports::{CacheError, VerificationCache};

/// Redis-backed cache keyed by (user, channel).
#[derive(Clone)]
pub struct RedisVerificationCache {
    conn: MultiplexedConnection,
}

impl RedisVerificationCache {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn key_for(user_id: UserId, channel_id: ChannelId) -> String {
        format!("member:{}:{}", user_id.as_i64(), channel_id.as_i64())
    }
}

impl std::fmt::Debug for RedisVerificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisVerificationCache")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VerificationCache for RedisVerificationCache {
    async fn get(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<Option<MembershipFact>, CacheError> {
        let key = Self::key_for(user_id, channel_id);
        let mut conn = self.conn.clone();

        let payload: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()))?;

        match payload {
            Some(json) => {
                let fact: MembershipFact = serde_json::from_str(&json)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?;
                Ok(Some(fact.via_cache()))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, fact: MembershipFact, ttl: Duration) -> Result<(), CacheError> {
        let key = Self::key_for(fact.user_id, fact.channel_id);
        let json =
            serde_json::to_string(&fact).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();

        // Redis rejects a zero expiry; clamp sub-second TTLs up to 1s.
        conn.set_ex::<_, _, ()>(&key, json, ttl.as_secs().max(1))
            .await
            .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn invalidate(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), CacheError> {
        let key = Self::key_for(user_id, channel_id);
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(&key)
            .await
            .map_err(|e: redis::RedisError| CacheError::Unavailable(e.to_string()))?;

        Ok(())
    }
}
