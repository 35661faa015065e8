//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## External API Ports
//!
//! - `MembershipApi` - Membership lookups against the external API
//! - `ModerationApi` - Restriction and messaging side effects
//!
//! ## Resilience Ports
//!
//! - `RateLimiter` - Token-bucket pacing of outbound calls
//! - `CircuitBreaker` - External service failure shielding
//!
//! ## Storage Ports
//!
//! - `VerificationCache` - Cache-aside membership fact store
//! - `GroupRegistry` - Per-group gating configuration (read-only)
//! - `RestrictionLedger` - Idempotency store for enforcement
//! - `AuditSink` - Destination for the write-behind log
//!
//! ## Utility Ports
//!
//! - `Clock` - Current time, injectable for deterministic tests

mod audit_sink;
mod circuit_breaker;
mod clock;
mod group_registry;
mod membership_api;
mod moderation_api;
mod rate_limiter;
mod restriction_ledger;
mod verification_cache;

pub use audit_sink::{AuditSink, AuditSinkError};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState,
};
pub use clock::Clock;
pub use group_registry::{GroupRegistry, RegistryError};
pub use membership_api::{MembershipApi, MembershipApiError};
pub use moderation_api::{ModerationApi, ModerationApiError};
pub use rate_limiter::{LimiterPermit, LimiterSnapshot, RateLimitError, RateLimiter};
pub use restriction_ledger::{LedgerError, RestrictionLedger};
pub use verification_cache::{CacheError, VerificationCache};
