//! In-memory audit sink for tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::audit::AuditRecord;
use crate::ports::{AuditSink, AuditSinkError};

/// Audit sink that collects records in memory.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended so far, in arrival order.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enforcement::EnforcementOutcome;
    use crate::domain::foundation::{EventId, GroupId, Timestamp, UserId};

    fn sample_record() -> AuditRecord {
        AuditRecord::EnforcementApplied {
            event_id: EventId::new(),
            user_id: UserId::new(42).unwrap(),
            group_id: GroupId::new(-100500),
            outcome: EnforcementOutcome::Restricted,
            occurred_at: Timestamp::from_unix_secs(1_700_000_000),
        }
    }

    #[tokio::test]
    async fn appended_records_are_kept_in_order() {
        let sink = InMemoryAuditSink::new();
        let first = sample_record();
        let second = sample_record();

        sink.append(&first).await.unwrap();
        sink.append(&second).await.unwrap();

        let records = sink.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_id(), first.event_id());
        assert_eq!(records[1].event_id(), second.event_id());
    }
}
