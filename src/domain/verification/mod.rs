//! Verification domain module.
//!
//! The facts, policies, and verdicts that drive channel-membership
//! verification.
//!
//! # Module Structure
//!
//! - `status` - Membership status enumeration as reported by the API
//! - `fact` - Immutable (user, channel) membership facts
//! - `policy` - Cache TTL policy with asymmetric lifetimes and jitter
//! - `verdict` - Per-channel resolutions and the aggregate verdict
//! - `request` - Ephemeral per-event request state

mod fact;
mod policy;
mod request;
mod status;
mod verdict;

pub use fact::{FactSource, MembershipFact};
pub use policy::CachePolicy;
pub use request::VerificationRequest;
pub use status::ChannelMemberStatus;
pub use verdict::{ChannelResolution, UnresolvedReason, VerificationOutcome, Verdict};
