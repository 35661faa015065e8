//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `telegram` - Telegram Bot API client (membership + moderation)
//! - `cache` - verification cache backends (in-memory, Redis)
//! - `rate_limiter` - token bucket pacing outbound calls
//! - `circuit_breaker` - rolling-window breaker for the membership API
//! - `registry` - group gating configuration store
//! - `ledger` - restriction idempotency store
//! - `audit` - write-behind log sinks (in-memory, JSONL)
//! - `clock` - system and manual time sources

pub mod audit;
pub mod cache;
pub mod circuit_breaker;
pub mod clock;
pub mod ledger;
pub mod rate_limiter;
pub mod registry;
pub mod telegram;
