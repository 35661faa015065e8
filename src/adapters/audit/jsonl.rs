//! JSONL audit sink.
//!
//! Appends one JSON object per line to a log file. Each append opens the
//! file in append mode and issues a single write, so records from
//! concurrent drain workers land as whole lines.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::domain::audit::AuditRecord;
use crate::ports::{AuditSink, AuditSinkError};

/// Audit sink writing newline-delimited JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonlAuditSink {
    path: PathBuf,
}

impl JsonlAuditSink {
    /// Creates a sink targeting `path`. The file and its parent directory
    /// are created on first append.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| AuditSinkError::Serialization(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AuditSinkError::Io(e.to_string()))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AuditSinkError::Io(e.to_string()))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AuditSinkError::Io(e.to_string()))?;

        Ok(())
    }
}
