//! EnforcementEngine - turns verdicts into moderation side effects.
//!
//! A failed verdict restricts the user and posts one warning naming the
//! channels they must join; a passing verdict lifts a restriction this
//! engine applied earlier. The restriction ledger provides idempotency:
//! a user with a live ledger record is never restricted or warned twice,
//! and only users with a record are ever unrestricted.

use std::sync::Arc;

use crate::domain::audit::AuditRecord;
use crate::domain::enforcement::{EnforcementOutcome, RestrictionRecord};
use crate::domain::foundation::{EventId, GroupId, UserId};
use crate::domain::verification::VerificationOutcome;
use crate::ports::{Clock, LedgerError, ModerationApi, ModerationApiError, RestrictionLedger};

use super::audit::AuditLogger;
use super::metrics::EngineMetrics;

/// Enforcement failed part-way; the caller may retry on the next event.
#[derive(Debug, thiserror::Error)]
pub enum EnforcementError {
    #[error("moderation call failed: {0}")]
    Moderation(#[from] ModerationApiError),

    #[error("restriction ledger failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Applies verification outcomes to the group.
pub struct EnforcementEngine {
    moderation: Arc<dyn ModerationApi>,
    ledger: Arc<dyn RestrictionLedger>,
    clock: Arc<dyn Clock>,
    audit: AuditLogger,
    metrics: Arc<EngineMetrics>,
}

impl EnforcementEngine {
    pub fn new(
        moderation: Arc<dyn ModerationApi>,
        ledger: Arc<dyn RestrictionLedger>,
        clock: Arc<dyn Clock>,
        audit: AuditLogger,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            moderation,
            ledger,
            clock,
            audit,
            metrics,
        }
    }

    /// Translates one verification outcome into side effects.
    ///
    /// Degraded outcomes take the same path as satisfied ones: a user is
    /// never restricted over infrastructure trouble, and an existing
    /// restriction still lifts once the verdict stops being unsatisfied.
    pub async fn apply(
        &self,
        outcome: &VerificationOutcome,
    ) -> Result<EnforcementOutcome, EnforcementError> {
        let enforcement = if outcome.grants_access() {
            self.lift_if_restricted(outcome.group_id, outcome.user_id)
                .await?
        } else {
            self.restrict_if_needed(outcome).await?
        };

        self.metrics.record_enforcement(enforcement);
        if enforcement.changed_state() {
            self.audit.log(AuditRecord::EnforcementApplied {
                event_id: EventId::new(),
                user_id: outcome.user_id,
                group_id: outcome.group_id,
                outcome: enforcement,
                occurred_at: self.clock.now(),
            });
        }
        Ok(enforcement)
    }

    /// Restricts and warns unless the ledger shows it already happened.
    ///
    /// The ledger is written only after the restrict call succeeds. A
    /// failed warning does not undo the restriction; the record simply
    /// carries no message id to clean up later.
    async fn restrict_if_needed(
        &self,
        outcome: &VerificationOutcome,
    ) -> Result<EnforcementOutcome, EnforcementError> {
        let group_id = outcome.group_id;
        let user_id = outcome.user_id;

        if self.ledger.find(group_id, user_id).await?.is_some() {
            tracing::debug!(
                "User {} is already restricted in group {}, suppressing duplicate warning",
                user_id,
                group_id
            );
            return Ok(EnforcementOutcome::AlreadyRestricted);
        }

        self.moderation.restrict_member(group_id, user_id).await?;

        let missing = outcome.missing_channels();
        let warning_message_id = match self
            .moderation
            .send_warning(group_id, user_id, &missing)
            .await
        {
            Ok(message_id) => Some(message_id),
            Err(e) => {
                tracing::warn!(
                    "Restricted user {} in group {} but the warning failed: {}",
                    user_id,
                    group_id,
                    e
                );
                None
            }
        };

        let record = RestrictionRecord::new(group_id, user_id, self.clock.now(), warning_message_id);
        self.ledger.record(record).await?;

        tracing::info!(
            "Restricted user {} in group {} until they join {} channel(s)",
            user_id,
            group_id,
            missing.len()
        );
        Ok(EnforcementOutcome::Restricted)
    }

    /// Lifts a restriction this engine applied, if any.
    ///
    /// Warning-message cleanup is best effort; the permission change and
    /// the ledger clear are the contract.
    async fn lift_if_restricted(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<EnforcementOutcome, EnforcementError> {
        let Some(record) = self.ledger.find(group_id, user_id).await? else {
            return Ok(EnforcementOutcome::Noop);
        };

        self.moderation.lift_restrictions(group_id, user_id).await?;

        if let Some(message_id) = record.warning_message_id {
            if let Err(e) = self.moderation.delete_message(group_id, message_id).await {
                tracing::warn!(
                    "Failed to delete warning message {} in group {}: {}",
                    message_id,
                    group_id,
                    e
                );
            }
        }

        self.ledger.clear(group_id, user_id).await?;

        tracing::info!("Lifted restrictions for user {} in group {}", user_id, group_id);
        Ok(EnforcementOutcome::Lifted)
    }
}

impl std::fmt::Debug for EnforcementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnforcementEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::InMemoryAuditSink;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::ledger::InMemoryRestrictionLedger;
    use crate::domain::foundation::{ChannelId, MessageId, Timestamp};
    use crate::domain::verification::{ChannelResolution, FactSource, UnresolvedReason};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::watch;

    // ===== Test Infrastructure =====

    /// Moderation API that records every call and can fail on demand.
    #[derive(Default)]
    struct RecordingModeration {
        restricted: Mutex<Vec<(GroupId, UserId)>>,
        lifted: Mutex<Vec<(GroupId, UserId)>>,
        warnings: Mutex<Vec<(GroupId, UserId, Vec<ChannelId>)>>,
        deleted: Mutex<Vec<(GroupId, MessageId)>>,
        next_message_id: AtomicI64,
        fail_restrict: bool,
        fail_lift: bool,
        fail_warning: bool,
        fail_delete: bool,
    }

    impl RecordingModeration {
        fn restrict_count(&self) -> usize {
            self.restricted.lock().unwrap().len()
        }

        fn warning_count(&self) -> usize {
            self.warnings.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModerationApi for RecordingModeration {
        async fn restrict_member(
            &self,
            group_id: GroupId,
            user_id: UserId,
        ) -> Result<(), ModerationApiError> {
            if self.fail_restrict {
                return Err(ModerationApiError::Network("restrict failed".to_string()));
            }
            self.restricted.lock().unwrap().push((group_id, user_id));
            Ok(())
        }

        async fn lift_restrictions(
            &self,
            group_id: GroupId,
            user_id: UserId,
        ) -> Result<(), ModerationApiError> {
            if self.fail_lift {
                return Err(ModerationApiError::Network("lift failed".to_string()));
            }
            self.lifted.lock().unwrap().push((group_id, user_id));
            Ok(())
        }

        async fn send_warning(
            &self,
            group_id: GroupId,
            user_id: UserId,
            missing_channels: &[ChannelId],
        ) -> Result<MessageId, ModerationApiError> {
            if self.fail_warning {
                return Err(ModerationApiError::Network("warning failed".to_string()));
            }
            self.warnings
                .lock()
                .unwrap()
                .push((group_id, user_id, missing_channels.to_vec()));
            let id = self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(MessageId::new(id))
        }

        async fn delete_message(
            &self,
            group_id: GroupId,
            message_id: MessageId,
        ) -> Result<(), ModerationApiError> {
            if self.fail_delete {
                return Err(ModerationApiError::Network("delete failed".to_string()));
            }
            self.deleted.lock().unwrap().push((group_id, message_id));
            Ok(())
        }
    }

    struct Harness {
        engine: EnforcementEngine,
        moderation: Arc<RecordingModeration>,
        ledger: Arc<InMemoryRestrictionLedger>,
        sink: Arc<InMemoryAuditSink>,
        metrics: Arc<EngineMetrics>,
        clock: Arc<ManualClock>,
        // Keeps the drain workers alive for the duration of the test.
        _audit_shutdown: watch::Sender<bool>,
    }

    fn harness(moderation: RecordingModeration) -> Harness {
        let clock = Arc::new(ManualClock::starting_at(Timestamp::from_unix_secs(
            1_700_000_000,
        )));
        let moderation = Arc::new(moderation);
        let ledger = Arc::new(InMemoryRestrictionLedger::new());
        let sink = Arc::new(InMemoryAuditSink::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (audit, _drain) = AuditLogger::spawn(sink.clone(), Default::default(), shutdown_rx);
        let metrics = Arc::new(EngineMetrics::new());

        let engine = EnforcementEngine::new(
            moderation.clone(),
            ledger.clone(),
            clock.clone(),
            audit,
            metrics.clone(),
        );

        Harness {
            engine,
            moderation,
            ledger,
            sink,
            metrics,
            clock,
            _audit_shutdown: shutdown_tx,
        }
    }

    fn group() -> GroupId {
        GroupId::new(-1001000000001)
    }

    fn user() -> UserId {
        UserId::new(42).unwrap()
    }

    fn channel(n: i64) -> ChannelId {
        ChannelId::new(-1002000000000 - n)
    }

    fn satisfied_outcome() -> VerificationOutcome {
        VerificationOutcome::from_resolutions(
            user(),
            group(),
            vec![ChannelResolution::Resolved {
                channel_id: channel(1),
                is_member: true,
                source: FactSource::Api,
            }],
            Duration::from_millis(10),
        )
    }

    fn unsatisfied_outcome() -> VerificationOutcome {
        VerificationOutcome::from_resolutions(
            user(),
            group(),
            vec![
                ChannelResolution::Resolved {
                    channel_id: channel(1),
                    is_member: false,
                    source: FactSource::Api,
                },
                ChannelResolution::Resolved {
                    channel_id: channel(2),
                    is_member: false,
                    source: FactSource::Cache,
                },
            ],
            Duration::from_millis(10),
        )
    }

    fn degraded_outcome() -> VerificationOutcome {
        VerificationOutcome::from_resolutions(
            user(),
            group(),
            vec![ChannelResolution::Unresolved {
                channel_id: channel(1),
                reason: UnresolvedReason::CircuitOpen,
            }],
            Duration::from_millis(10),
        )
    }

    // ===== Restriction Path =====

    #[tokio::test]
    async fn unsatisfied_verdict_restricts_and_warns() {
        let h = harness(RecordingModeration::default());

        let outcome = h.engine.apply(&unsatisfied_outcome()).await.unwrap();

        assert_eq!(outcome, EnforcementOutcome::Restricted);
        assert_eq!(h.moderation.restrict_count(), 1);
        assert_eq!(h.moderation.warning_count(), 1);

        let warning = &h.moderation.warnings.lock().unwrap()[0];
        assert_eq!(warning.2, vec![channel(1), channel(2)]);

        let record = h.ledger.find(group(), user()).await.unwrap().unwrap();
        assert!(record.warning_message_id.is_some());
        assert_eq!(record.restricted_at, h.clock.now());
    }

    #[tokio::test]
    async fn repeated_unsatisfied_verdicts_warn_only_once() {
        let h = harness(RecordingModeration::default());

        let first = h.engine.apply(&unsatisfied_outcome()).await.unwrap();
        let second = h.engine.apply(&unsatisfied_outcome()).await.unwrap();

        assert_eq!(first, EnforcementOutcome::Restricted);
        assert_eq!(second, EnforcementOutcome::AlreadyRestricted);
        assert_eq!(h.moderation.restrict_count(), 1);
        assert_eq!(h.moderation.warning_count(), 1);
    }

    #[tokio::test]
    async fn failed_warning_still_records_the_restriction() {
        let h = harness(RecordingModeration {
            fail_warning: true,
            ..Default::default()
        });

        let outcome = h.engine.apply(&unsatisfied_outcome()).await.unwrap();

        assert_eq!(outcome, EnforcementOutcome::Restricted);
        let record = h.ledger.find(group(), user()).await.unwrap().unwrap();
        assert!(record.warning_message_id.is_none());
    }

    #[tokio::test]
    async fn failed_restrict_leaves_no_ledger_record() {
        let h = harness(RecordingModeration {
            fail_restrict: true,
            ..Default::default()
        });

        let result = h.engine.apply(&unsatisfied_outcome()).await;

        assert!(matches!(result, Err(EnforcementError::Moderation(_))));
        assert!(h.ledger.find(group(), user()).await.unwrap().is_none());
        assert_eq!(h.moderation.warning_count(), 0);
    }

    // ===== Lift Path =====

    #[tokio::test]
    async fn satisfied_verdict_without_a_record_is_a_noop() {
        let h = harness(RecordingModeration::default());

        let outcome = h.engine.apply(&satisfied_outcome()).await.unwrap();

        assert_eq!(outcome, EnforcementOutcome::Noop);
        assert_eq!(h.moderation.restrict_count(), 0);
        assert!(h.moderation.lifted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn satisfied_verdict_lifts_an_existing_restriction() {
        let h = harness(RecordingModeration::default());
        h.ledger
            .record(RestrictionRecord::new(
                group(),
                user(),
                h.clock.now(),
                Some(MessageId::new(555)),
            ))
            .await
            .unwrap();

        let outcome = h.engine.apply(&satisfied_outcome()).await.unwrap();

        assert_eq!(outcome, EnforcementOutcome::Lifted);
        assert_eq!(h.moderation.lifted.lock().unwrap().len(), 1);
        assert_eq!(
            h.moderation.deleted.lock().unwrap()[0],
            (group(), MessageId::new(555))
        );
        assert!(h.ledger.find(group(), user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_warning_cleanup_does_not_block_the_lift() {
        let h = harness(RecordingModeration {
            fail_delete: true,
            ..Default::default()
        });
        h.ledger
            .record(RestrictionRecord::new(
                group(),
                user(),
                h.clock.now(),
                Some(MessageId::new(555)),
            ))
            .await
            .unwrap();

        let outcome = h.engine.apply(&satisfied_outcome()).await.unwrap();

        assert_eq!(outcome, EnforcementOutcome::Lifted);
        assert!(h.ledger.find(group(), user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_lift_keeps_the_ledger_record() {
        let h = harness(RecordingModeration {
            fail_lift: true,
            ..Default::default()
        });
        h.ledger
            .record(RestrictionRecord::new(group(), user(), h.clock.now(), None))
            .await
            .unwrap();

        let result = h.engine.apply(&satisfied_outcome()).await;

        assert!(matches!(result, Err(EnforcementError::Moderation(_))));
        assert!(h.ledger.find(group(), user()).await.unwrap().is_some());
    }

    // ===== Degraded Verdicts =====

    #[tokio::test]
    async fn degraded_verdict_never_restricts() {
        let h = harness(RecordingModeration::default());

        let outcome = h.engine.apply(&degraded_outcome()).await.unwrap();

        assert_eq!(outcome, EnforcementOutcome::Noop);
        assert_eq!(h.moderation.restrict_count(), 0);
    }

    #[tokio::test]
    async fn degraded_verdict_still_lifts_an_existing_restriction() {
        let h = harness(RecordingModeration::default());
        h.ledger
            .record(RestrictionRecord::new(group(), user(), h.clock.now(), None))
            .await
            .unwrap();

        let outcome = h.engine.apply(&degraded_outcome()).await.unwrap();

        assert_eq!(outcome, EnforcementOutcome::Lifted);
    }

    // ===== Audit and Metrics =====

    #[tokio::test]
    async fn state_changes_are_audited_and_counted() {
        let h = harness(RecordingModeration::default());

        h.engine.apply(&unsatisfied_outcome()).await.unwrap();
        h.engine.apply(&satisfied_outcome()).await.unwrap();
        h.engine.apply(&satisfied_outcome()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let records = h.sink.records().await;
        let enforcement: Vec<_> = records
            .iter()
            .filter_map(|r| match r {
                AuditRecord::EnforcementApplied { outcome, .. } => Some(*outcome),
                _ => None,
            })
            .collect();
        assert_eq!(
            enforcement,
            vec![EnforcementOutcome::Restricted, EnforcementOutcome::Lifted]
        );

        let snapshot = h.metrics.snapshot();
        assert_eq!(snapshot.restrictions_applied, 1);
        assert_eq!(snapshot.restrictions_lifted, 1);
    }
}
