//! Verification cache adapters.
//!
//! - `InMemoryVerificationCache` - in-process map for testing and
//!   single-server deployments
//! - `RedisVerificationCache` - shared cache for multi-server deployments

mod in_memory;
mod redis;

pub use in_memory::InMemoryVerificationCache;
pub use redis::RedisVerificationCache;
