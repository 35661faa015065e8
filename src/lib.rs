//! Gatewarden - Channel-Membership Verification & Enforcement Engine
//!
//! This crate decides, per message or join event in a protected Telegram
//! group, whether the user is a member of every linked channel, restricts
//! those who are not, and lifts the restriction once they comply.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
