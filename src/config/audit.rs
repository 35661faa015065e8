//! Audit log configuration

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::AuditLoggerConfig;

use super::error::ValidationError;

/// Audit log configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// File the JSONL audit log appends to; in-memory sink when unset
    pub log_path: Option<String>,

    /// Records buffered between the engine and the drain workers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Background workers draining the queue
    #[serde(default = "default_drain_workers")]
    pub drain_workers: usize,
}

impl AuditConfig {
    /// Get the log path, if configured
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_path.as_ref().map(PathBuf::from)
    }

    /// Build the audit logger configuration
    pub fn logger_config(&self) -> AuditLoggerConfig {
        AuditLoggerConfig::default()
            .with_queue_capacity(self.queue_capacity)
            .with_drain_workers(self.drain_workers)
    }

    /// Validate audit configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_capacity == 0 || self.drain_workers == 0 {
            return Err(ValidationError::InvalidAuditQueue);
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            queue_capacity: default_queue_capacity(),
            drain_workers: default_drain_workers(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1_024
}

fn default_drain_workers() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_config_defaults() {
        let config = AuditConfig::default();
        assert!(config.log_path().is_none());
        assert_eq!(config.queue_capacity, 1_024);
        assert_eq!(config.drain_workers, 2);
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let config = AuditConfig {
            drain_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidAuditQueue)
        ));
    }

    #[test]
    fn test_logger_config_conversion() {
        let config = AuditConfig {
            queue_capacity: 64,
            drain_workers: 1,
            ..Default::default()
        };
        let built = config.logger_config();
        assert_eq!(built.queue_capacity, 64);
        assert_eq!(built.drain_workers, 1);
    }
}
