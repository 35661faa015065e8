//! RestrictionLedger port - idempotency store for enforcement.
//!
//! Tracks which users this engine has restricted in which groups. The
//! enforcement engine checks the ledger before acting, so repeated
//! UNSATISFIED verdicts for an already-restricted user never duplicate
//! warnings, and only restrictions we applied are ever lifted.

use async_trait::async_trait;

use crate::domain::enforcement::RestrictionRecord;
use crate::domain::foundation::{GroupId, UserId};

/// Port for the restriction ledger.
#[async_trait]
pub trait RestrictionLedger: Send + Sync {
    /// Look up the live restriction for a (group, user) pair, if any.
    async fn find(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<RestrictionRecord>, LedgerError>;

    /// Record a restriction this engine just applied.
    ///
    /// Overwrites any existing record for the same pair.
    async fn record(&self, record: RestrictionRecord) -> Result<(), LedgerError>;

    /// Clear the record once the restriction is lifted.
    ///
    /// Clearing an absent record is not an error.
    async fn clear(&self, group_id: GroupId, user_id: UserId) -> Result<(), LedgerError>;
}

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Ledger backend is unavailable.
    #[error("restriction ledger unavailable: {0}")]
    Unavailable(String),
}
