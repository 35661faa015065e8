//! Audit records for the write-behind verification log.
//!
//! Records are named in past tense: they describe something that already
//! happened. The request path only enqueues them; drain workers move them
//! to the configured sink.

use serde::{Deserialize, Serialize};

use crate::domain::enforcement::EnforcementOutcome;
use crate::domain::foundation::{ChannelId, EventId, GroupId, Timestamp, UserId};
use crate::domain::verification::Verdict;

/// How a single membership API call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ApiCallResult {
    /// The API answered with a definite membership value.
    Resolved { is_member: bool },

    /// The call failed after exhausting its attempts.
    Failed { error: String },
}

/// One record in the write-behind log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum AuditRecord {
    /// A membership API call completed (successfully or not).
    MembershipChecked {
        event_id: EventId,
        user_id: UserId,
        channel_id: ChannelId,
        outcome: ApiCallResult,
        attempts: u32,
        latency_ms: u64,
        occurred_at: Timestamp,
    },

    /// A verification request produced its aggregate verdict.
    VerdictIssued {
        event_id: EventId,
        user_id: UserId,
        group_id: GroupId,
        verdict: Verdict,
        missing_channels: Vec<ChannelId>,
        unresolved_channels: Vec<ChannelId>,
        admin_bypass: bool,
        elapsed_ms: u64,
        occurred_at: Timestamp,
    },

    /// A verdict was translated into side effects.
    EnforcementApplied {
        event_id: EventId,
        user_id: UserId,
        group_id: GroupId,
        outcome: EnforcementOutcome,
        occurred_at: Timestamp,
    },
}

impl AuditRecord {
    /// Unique identifier of this record.
    pub fn event_id(&self) -> EventId {
        match self {
            AuditRecord::MembershipChecked { event_id, .. } => *event_id,
            AuditRecord::VerdictIssued { event_id, .. } => *event_id,
            AuditRecord::EnforcementApplied { event_id, .. } => *event_id,
        }
    }

    /// When the recorded action happened.
    pub fn occurred_at(&self) -> Timestamp {
        match self {
            AuditRecord::MembershipChecked { occurred_at, .. } => *occurred_at,
            AuditRecord::VerdictIssued { occurred_at, .. } => *occurred_at,
            AuditRecord::EnforcementApplied { occurred_at, .. } => *occurred_at,
        }
    }

    /// The user the record concerns.
    pub fn user_id(&self) -> UserId {
        match self {
            AuditRecord::MembershipChecked { user_id, .. } => *user_id,
            AuditRecord::VerdictIssued { user_id, .. } => *user_id,
            AuditRecord::EnforcementApplied { user_id, .. } => *user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_checked_serializes_with_record_tag() {
        let record = AuditRecord::MembershipChecked {
            event_id: EventId::new(),
            user_id: UserId::new(42).unwrap(),
            channel_id: ChannelId::new(-100500),
            outcome: ApiCallResult::Resolved { is_member: true },
            attempts: 1,
            latency_ms: 34,
            occurred_at: Timestamp::from_unix_secs(1_700_000_000),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"record\":\"membership_checked\""));
        assert!(json.contains("\"result\":\"resolved\""));
    }

    #[test]
    fn verdict_issued_roundtrips() {
        let record = AuditRecord::VerdictIssued {
            event_id: EventId::new(),
            user_id: UserId::new(42).unwrap(),
            group_id: GroupId::new(-100900),
            verdict: Verdict::Degraded,
            missing_channels: vec![],
            unresolved_channels: vec![ChannelId::new(-100500)],
            admin_bypass: false,
            elapsed_ms: 2500,
            occurred_at: Timestamp::from_unix_secs(1_700_000_000),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn accessors_reach_into_any_variant() {
        let event_id = EventId::new();
        let record = AuditRecord::EnforcementApplied {
            event_id,
            user_id: UserId::new(9).unwrap(),
            group_id: GroupId::new(-3),
            outcome: EnforcementOutcome::Restricted,
            occurred_at: Timestamp::from_unix_secs(1_700_000_123),
        };

        assert_eq!(record.event_id(), event_id);
        assert_eq!(record.user_id(), UserId::new(9).unwrap());
        assert_eq!(record.occurred_at(), Timestamp::from_unix_secs(1_700_000_123));
    }
}
