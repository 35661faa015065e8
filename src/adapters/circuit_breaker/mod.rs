//! Circuit breaker adapter.

mod rolling;

pub use rolling::RollingWindowBreaker;
