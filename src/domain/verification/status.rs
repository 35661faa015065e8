//! Channel membership status as reported by the membership API.

use serde::{Deserialize, Serialize};

/// Membership status of a user within a single channel.
///
/// Mirrors the stable enumeration the membership API reports. The wire
/// adapter is responsible for folding ambiguous reports (a restricted user
/// who already left) into these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMemberStatus {
    /// Channel owner.
    Creator,

    /// Channel administrator.
    Administrator,

    /// Ordinary member.
    Member,

    /// Member under channel-level restrictions, but still present.
    Restricted,

    /// Left voluntarily, or never joined.
    Left,

    /// Removed and banned by an administrator.
    Kicked,
}

impl ChannelMemberStatus {
    /// Returns true if this status counts as being in the channel.
    ///
    /// Restricted users are present and therefore count; only Left and
    /// Kicked fail the membership requirement.
    pub fn is_member(&self) -> bool {
        !matches!(
            self,
            ChannelMemberStatus::Left | ChannelMemberStatus::Kicked
        )
    }

    /// Returns true for statuses that hold moderation power in the channel.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            ChannelMemberStatus::Creator | ChannelMemberStatus::Administrator
        )
    }
}
