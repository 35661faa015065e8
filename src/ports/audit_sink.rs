//! AuditSink port - destination for the write-behind log.
//!
//! Drain workers move audit records from the in-process queue to a sink
//! implementing this port. The request path never touches the sink
//! directly, so a slow sink cannot block verification.

use async_trait::async_trait;

use crate::domain::audit::AuditRecord;

/// Port for appending audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record to the log.
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError>;
}

/// Errors from audit sinks.
#[derive(Debug, thiserror::Error)]
pub enum AuditSinkError {
    /// The sink could not be written.
    #[error("audit sink io error: {0}")]
    Io(String),

    /// A record could not be encoded for the sink.
    #[error("audit record serialization failed: {0}")]
    Serialization(String),
}
