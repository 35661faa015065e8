//! Application layer - the services that drive verification and enforcement.
//!
//! This layer orchestrates domain operations and coordinates between ports:
//! the resilient membership client, the verification orchestrator, the
//! enforcement engine, and the engine facade that ties them to events.

pub mod audit;
pub mod enforcement;
pub mod engine;
pub mod membership_client;
pub mod metrics;
pub mod orchestrator;

pub use audit::{AuditDrain, AuditLogger, AuditLoggerConfig};
pub use enforcement::{EnforcementEngine, EnforcementError};
pub use engine::{BuildError, EngineError, EventOutcome, GateEngine, GateEngineBuilder, GateEvent};
pub use membership_client::{CheckError, MembershipClient, MembershipClientConfig};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use orchestrator::{VerificationConfig, VerificationOrchestrator};
