//! Rate limiter adapter.
//!
//! ## Usage
//!
//! ```ignore
//! use gatewarden::adapters::rate_limiter::{TokenBucketConfig, TokenBucketLimiter};
//!
//! let limiter = TokenBucketLimiter::with_config(
//!     TokenBucketConfig::default(),
//!     Arc::new(SystemClock::new()),
//! );
//! let permit = limiter.acquire().await?;
//! ```

mod config;
mod token_bucket;

pub use config::TokenBucketConfig;
pub use token_bucket::TokenBucketLimiter;
