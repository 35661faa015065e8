//! Telegram Bot API adapter.
//!
//! One HTTP client backs both outward-facing ports: `MembershipApi` for
//! `getChatMember` lookups and `ModerationApi` for restrictions, warnings
//! and message cleanup.

mod client;
mod types;

pub use client::{TelegramApi, TelegramConfig};
pub use types::{ApiResponse, ChatMemberInfo, ChatPermissions, ResponseParameters};
