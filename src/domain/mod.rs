//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `verification` - Membership facts, cache policy, verdicts
//! - `enforcement` - Enforcement outcomes and restriction records
//! - `audit` - Write-behind log records

pub mod audit;
pub mod enforcement;
pub mod foundation;
pub mod verification;
