//! AuditLogger - write-behind delivery of audit records.
//!
//! The request path calls `log()`, which enqueues onto a bounded channel
//! and returns immediately; drain workers move records to the configured
//! sink in the background. A full queue drops the record rather than
//! blocking verification.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `queue_capacity` | 1024 | Records the queue holds before dropping |
//! | `drain_workers` | 2 | Concurrent workers appending to the sink |
//!
//! ## Graceful Shutdown
//!
//! Workers listen on a watch channel; on shutdown they drain whatever is
//! still queued before exiting, so `AuditDrain::wait` returns only after
//! every accepted record reached the sink.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::domain::audit::AuditRecord;
use crate::ports::AuditSink;

/// Configuration for the audit logger.
#[derive(Debug, Clone)]
pub struct AuditLoggerConfig {
    /// Maximum records queued before `log` starts dropping.
    pub queue_capacity: usize,

    /// Number of drain workers appending to the sink.
    pub drain_workers: usize,
}

impl Default for AuditLoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            drain_workers: 2,
        }
    }
}

impl AuditLoggerConfig {
    /// Create config with custom queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Create config with custom worker count.
    pub fn with_drain_workers(mut self, workers: usize) -> Self {
        self.drain_workers = workers;
        self
    }
}

/// Non-blocking handle the request path logs through.
#[derive(Clone)]
pub struct AuditLogger {
    tx: mpsc::Sender<AuditRecord>,
    dropped: Arc<AtomicU64>,
}

/// Join handle for the drain workers.
pub struct AuditDrain {
    workers: Vec<JoinHandle<()>>,
}

impl AuditDrain {
    /// Wait for every worker to finish draining.
    pub async fn wait(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!("Audit drain worker panicked: {}", e);
            }
        }
    }
}

impl AuditLogger {
    /// Start the logger: a bounded queue plus background drain workers.
    ///
    /// Workers run until `shutdown` flips to true (draining the queue
    /// first) or until every `AuditLogger` clone is dropped.
    pub fn spawn(
        sink: Arc<dyn AuditSink>,
        config: AuditLoggerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, AuditDrain) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..config.drain_workers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                let sink = Arc::clone(&sink);
                let shutdown = shutdown.clone();
                tokio::spawn(drain_loop(rx, sink, shutdown))
            })
            .collect();

        let logger = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (logger, AuditDrain { workers })
    }

    /// Enqueue a record without blocking.
    ///
    /// A full or closed queue drops the record and increments the dropped
    /// counter; only the first drop warns.
    pub fn log(&self, record: AuditRecord) {
        if self.tx.try_send(record).is_err() {
            let dropped_before = self.dropped.fetch_add(1, Ordering::Relaxed);
            if dropped_before == 0 {
                tracing::warn!("Audit queue full, dropping records");
            }
        }
    }

    /// Records dropped because the queue was full or closed.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("dropped", &self.dropped_count())
            .finish_non_exhaustive()
    }
}

async fn drain_loop(
    rx: Arc<Mutex<mpsc::Receiver<AuditRecord>>>,
    sink: Arc<dyn AuditSink>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                record = rx.recv() => record,

                changed = shutdown.changed() => {
                    // A dropped shutdown handle counts as a shutdown signal.
                    if changed.is_err() || *shutdown.borrow() {
                        // Drain the queue then exit.
                        while let Ok(record) = rx.try_recv() {
                            append(&sink, &record).await;
                        }
                        return;
                    }
                    continue;
                }
            }
        };

        match next {
            Some(record) => append(&sink, &record).await,
            // Every sender dropped - nothing more will arrive.
            None => return,
        }
    }
}

async fn append(sink: &Arc<dyn AuditSink>, record: &AuditRecord) {
    if let Err(e) = sink.append(record).await {
        tracing::warn!("Failed to append audit record: {}", e);
    }
}
