//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bot token format")]
    InvalidBotToken,

    #[error("API base URL must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Cache jitter must be below 50%")]
    InvalidJitter,

    #[error("Jittered negative TTL must stay below jittered positive TTL")]
    InvalidCacheTtls,

    #[error("Rate limiter capacity and refill rate must be positive")]
    InvalidLimiterRate,

    #[error("Circuit breaker failure threshold must be at least 1")]
    InvalidBreakerThreshold,

    #[error("Circuit breaker backoff must not shrink the reset timeout")]
    InvalidBreakerBackoff,

    #[error("Concurrent check count must be at least 1")]
    InvalidConcurrency,

    #[error("Audit queue capacity and worker count must be at least 1")]
    InvalidAuditQueue,
}
