//! Verdicts and per-channel resolutions for a verification request.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::{ChannelId, GroupId, UserId};
use crate::domain::verification::FactSource;

/// Aggregate decision for one verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every required channel resolved to membership.
    Satisfied,

    /// At least one required channel resolved to non-membership.
    Unsatisfied,

    /// No channel resolved false, but at least one could not be resolved
    /// because a dependency failed. Treated as satisfied downstream.
    Degraded,
}

impl Verdict {
    /// Combines per-channel resolutions with AND semantics.
    ///
    /// A proven non-membership dominates: the verdict is Unsatisfied even
    /// when sibling channels are unresolved, because restriction is
    /// justified by proof regardless of degraded dependencies. Without
    /// proof of absence, any unresolved channel degrades the verdict.
    pub fn combine(resolutions: &[ChannelResolution]) -> Verdict {
        let mut any_unresolved = false;
        for resolution in resolutions {
            match resolution {
                ChannelResolution::Resolved {
                    is_member: false, ..
                } => return Verdict::Unsatisfied,
                ChannelResolution::Unresolved { .. } => any_unresolved = true,
                ChannelResolution::Resolved { .. } => {}
            }
        }
        if any_unresolved {
            Verdict::Degraded
        } else {
            Verdict::Satisfied
        }
    }

    /// Returns true if this verdict leaves the user's access untouched.
    ///
    /// Degraded fails open: infrastructure trouble never restricts a user.
    pub fn grants_access(&self) -> bool {
        matches!(self, Verdict::Satisfied | Verdict::Degraded)
    }
}

/// Why a channel check could not produce a definite answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The circuit breaker rejected the call before any network attempt.
    CircuitOpen,

    /// Local rate limiting or an API throttle signal blocked the call.
    RateLimited,

    /// The API call failed after retries.
    Upstream,

    /// The overall request deadline expired before the check finished.
    DeadlineExceeded,

    /// The group registry could not be consulted.
    RegistryUnavailable,
}

/// Outcome of one required-channel check within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChannelResolution {
    /// Membership resolved to a definite answer.
    Resolved {
        channel_id: ChannelId,
        is_member: bool,
        source: FactSource,
    },

    /// The dependency, not the user, failed; fail-open applies.
    Unresolved {
        channel_id: ChannelId,
        reason: UnresolvedReason,
    },
}

impl ChannelResolution {
    /// The channel this resolution concerns.
    pub fn channel_id(&self) -> ChannelId {
        match self {
            ChannelResolution::Resolved { channel_id, .. } => *channel_id,
            ChannelResolution::Unresolved { channel_id, .. } => *channel_id,
        }
    }

    /// Returns true if the channel resolved to proven non-membership.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            ChannelResolution::Resolved {
                is_member: false,
                ..
            }
        )
    }

    /// Returns true if the channel could not be resolved.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ChannelResolution::Unresolved { .. })
    }
}

/// Full result of a verification request.
///
/// Carries everything the enforcement layer and the audit log need: the
/// verdict, how each channel resolved, and how the decision was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub user_id: UserId,
    pub group_id: GroupId,
    pub verdict: Verdict,
    pub resolutions: Vec<ChannelResolution>,
    /// True when the user is a group administrator and checks were skipped.
    pub admin_bypass: bool,
    pub elapsed: Duration,
}

impl VerificationOutcome {
    /// Builds an outcome by combining channel resolutions.
    pub fn from_resolutions(
        user_id: UserId,
        group_id: GroupId,
        resolutions: Vec<ChannelResolution>,
        elapsed: Duration,
    ) -> Self {
        let verdict = Verdict::combine(&resolutions);
        Self {
            user_id,
            group_id,
            verdict,
            resolutions,
            admin_bypass: false,
            elapsed,
        }
    }

    /// Builds the short-circuit outcome for a group administrator.
    pub fn admin_bypass(user_id: UserId, group_id: GroupId, elapsed: Duration) -> Self {
        Self {
            user_id,
            group_id,
            verdict: Verdict::Satisfied,
            resolutions: Vec::new(),
            admin_bypass: true,
            elapsed,
        }
    }

    /// Channels that resolved to proven non-membership.
    pub fn missing_channels(&self) -> Vec<ChannelId> {
        self.resolutions
            .iter()
            .filter(|r| r.is_missing())
            .map(|r| r.channel_id())
            .collect()
    }

    /// Channels that could not be resolved.
    pub fn unresolved_channels(&self) -> Vec<ChannelId> {
        self.resolutions
            .iter()
            .filter(|r| r.is_unresolved())
            .map(|r| r.channel_id())
            .collect()
    }

    /// Returns true if the user's access is left untouched.
    pub fn grants_access(&self) -> bool {
        self.verdict.grants_access()
    }
}
