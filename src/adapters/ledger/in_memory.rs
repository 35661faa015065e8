//! In-memory restriction ledger for testing and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::enforcement::RestrictionRecord;
use crate::domain::foundation::{GroupId, UserId};
use crate::ports::{LedgerError, RestrictionLedger};

/// In-memory ledger keyed by (group, user).
#[derive(Debug, Default)]
pub struct InMemoryRestrictionLedger {
    records: RwLock<HashMap<(GroupId, UserId), RestrictionRecord>>,
}

impl InMemoryRestrictionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live restrictions.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl RestrictionLedger for InMemoryRestrictionLedger {
    async fn find(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<RestrictionRecord>, LedgerError> {
        let records = self.records.read().await;
        Ok(records.get(&(group_id, user_id)).copied())
    }

    async fn record(&self, record: RestrictionRecord) -> Result<(), LedgerError> {
        let mut records = self.records.write().await;
        records.insert((record.group_id, record.user_id), record);
        Ok(())
    }

    async fn clear(&self, group_id: GroupId, user_id: UserId) -> Result<(), LedgerError> {
        let mut records = self.records.write().await;
        records.remove(&(group_id, user_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MessageId, Timestamp};

    fn record() -> RestrictionRecord {
        RestrictionRecord::new(
            GroupId::new(-100500),
            UserId::new(42).unwrap(),
            Timestamp::from_unix_secs(1_700_000_000),
            Some(MessageId::new(77)),
        )
    }

    #[tokio::test]
    async fn find_returns_recorded_restriction() {
        let ledger = InMemoryRestrictionLedger::new();
        let rec = record();
        ledger.record(rec).await.unwrap();

        let found = ledger.find(rec.group_id, rec.user_id).await.unwrap();

        assert_eq!(found, Some(rec));
    }

    #[tokio::test]
    async fn find_on_empty_ledger_returns_none() {
        let ledger = InMemoryRestrictionLedger::new();

        let found = ledger
            .find(GroupId::new(-1), UserId::new(1).unwrap())
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn clear_removes_the_record() {
        let ledger = InMemoryRestrictionLedger::new();
        let rec = record();
        ledger.record(rec).await.unwrap();

        ledger.clear(rec.group_id, rec.user_id).await.unwrap();

        assert!(ledger.find(rec.group_id, rec.user_id).await.unwrap().is_none());
        assert_eq!(ledger.record_count().await, 0);
    }

    #[tokio::test]
    async fn clear_of_absent_record_is_not_an_error() {
        let ledger = InMemoryRestrictionLedger::new();

        let result = ledger
            .clear(GroupId::new(-1), UserId::new(1).unwrap())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn record_overwrites_existing_entry() {
        let ledger = InMemoryRestrictionLedger::new();
        let first = record();
        ledger.record(first).await.unwrap();

        let newer = RestrictionRecord::new(
            first.group_id,
            first.user_id,
            first.restricted_at.plus_secs(60),
            None,
        );
        ledger.record(newer).await.unwrap();

        let found = ledger.find(first.group_id, first.user_id).await.unwrap();
        assert_eq!(found, Some(newer));
        assert_eq!(ledger.record_count().await, 1);
    }
}
