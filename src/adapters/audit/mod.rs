//! Audit sink adapters.
//!
//! - `InMemoryAuditSink` - collects records in memory, for tests
//! - `JsonlAuditSink` - appends newline-delimited JSON to a log file

mod in_memory;
mod jsonl;

pub use in_memory::InMemoryAuditSink;
pub use jsonl::JsonlAuditSink;
