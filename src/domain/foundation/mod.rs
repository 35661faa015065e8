//! Foundation module - Shared domain primitives.
//!
//! Contains the identifier newtypes, timestamp value object, and error
//! types that form the vocabulary of the gatewarden domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ChannelId, EventId, GroupId, MessageId, UserId};
pub use timestamp::Timestamp;
