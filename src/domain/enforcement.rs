//! Enforcement domain types.
//!
//! What happened when a verdict was translated into side effects, and the
//! record the restriction ledger keeps per restricted user.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GroupId, MessageId, Timestamp, UserId};

/// Result of applying a verdict to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementOutcome {
    /// The user was restricted and warned.
    Restricted,

    /// The user was already restricted; no side effects were repeated.
    AlreadyRestricted,

    /// A previously applied restriction was lifted.
    Lifted,

    /// Nothing to do.
    Noop,
}

impl EnforcementOutcome {
    /// Returns true if this outcome changed the user's state in the group.
    pub fn changed_state(&self) -> bool {
        matches!(
            self,
            EnforcementOutcome::Restricted | EnforcementOutcome::Lifted
        )
    }
}

/// Ledger entry for a restriction this engine applied.
///
/// Existence of a record is the idempotency signal: a user with a live
/// record is never warned again, and only users with a record are
/// unrestricted when they later satisfy the requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionRecord {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub restricted_at: Timestamp,
    /// The warning message sent alongside the restriction, if delivery
    /// succeeded.
    pub warning_message_id: Option<MessageId>,
}

impl RestrictionRecord {
    /// Creates a record for a restriction applied now.
    pub fn new(
        group_id: GroupId,
        user_id: UserId,
        restricted_at: Timestamp,
        warning_message_id: Option<MessageId>,
    ) -> Self {
        Self {
            group_id,
            user_id,
            restricted_at,
            warning_message_id,
        }
    }
}
