//! Membership facts - the unit of knowledge the cache and client exchange.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChannelId, Timestamp, UserId};

/// Where a membership fact was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactSource {
    /// Served from the verification cache.
    Cache,

    /// Freshly resolved against the membership API.
    Api,
}

/// A single resolved membership check for one (user, channel) pair.
///
/// Facts are immutable. A newer fact for the same key supersedes an older
/// one; nothing ever mutates an existing fact in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipFact {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub is_member: bool,
    pub checked_at: Timestamp,
    pub source: FactSource,
}

impl MembershipFact {
    /// Creates a fact freshly resolved against the membership API.
    pub fn from_api(
        user_id: UserId,
        channel_id: ChannelId,
        is_member: bool,
        checked_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            channel_id,
            is_member,
            checked_at,
            source: FactSource::Api,
        }
    }

    /// Returns the same fact marked as served from the cache.
    ///
    /// Cache adapters apply this on read, so consumers can distinguish a
    /// fresh API answer from a cached one.
    pub fn via_cache(self) -> Self {
        Self {
            source: FactSource::Cache,
            ..self
        }
    }
}
