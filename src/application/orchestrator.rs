//! VerificationOrchestrator - turns one event into one verdict.
//!
//! For each event the orchestrator loads the group's gating configuration,
//! short-circuits administrators, then resolves every required channel
//! concurrently: cache first, membership API on a miss. The per-channel
//! resolutions combine into an aggregate verdict under a hard deadline;
//! channels still pending when the deadline fires are marked unresolved,
//! which degrades the verdict instead of punishing the user.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::domain::audit::AuditRecord;
use crate::domain::foundation::{ChannelId, EventId, GroupId, Timestamp, UserId};
use crate::domain::verification::{
    CachePolicy, ChannelResolution, UnresolvedReason, Verdict, VerificationOutcome,
    VerificationRequest,
};
use crate::ports::{Clock, GroupRegistry, RegistryError, VerificationCache};

use super::audit::AuditLogger;
use super::membership_client::{CheckError, MembershipClient};
use super::metrics::EngineMetrics;

/// Tuning for the verification pass.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Channels checked in parallel per request.
    pub max_concurrent_checks: usize,

    /// Hard ceiling on one verification pass, cache and API included.
    pub request_deadline: Duration,

    /// TTL policy for facts written back to the cache.
    pub cache_policy: CachePolicy,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: 4,
            request_deadline: Duration::from_millis(2_500),
            cache_policy: CachePolicy::default(),
        }
    }
}

impl VerificationConfig {
    pub fn with_max_concurrent_checks(mut self, max: usize) -> Self {
        self.max_concurrent_checks = max.max(1);
        self
    }

    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }
}

/// Produces verification outcomes for (group, user) pairs.
pub struct VerificationOrchestrator {
    registry: Arc<dyn GroupRegistry>,
    cache: Arc<dyn VerificationCache>,
    client: Arc<MembershipClient>,
    clock: Arc<dyn Clock>,
    audit: AuditLogger,
    metrics: Arc<EngineMetrics>,
    config: VerificationConfig,
}

impl VerificationOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<dyn GroupRegistry>,
        cache: Arc<dyn VerificationCache>,
        client: Arc<MembershipClient>,
        clock: Arc<dyn Clock>,
        audit: AuditLogger,
        metrics: Arc<EngineMetrics>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            client,
            clock,
            audit,
            metrics,
            config,
        }
    }

    /// Runs one full verification pass and returns the outcome.
    ///
    /// Never fails: configuration problems resolve to a trivially
    /// satisfied outcome and infrastructure problems degrade the verdict.
    pub async fn verify(&self, group_id: GroupId, user_id: UserId) -> VerificationOutcome {
        let started = self.clock.now();

        let channels = match self.registry.required_channels(group_id).await {
            Ok(channels) => channels,
            Err(RegistryError::GroupNotRegistered { .. }) => {
                tracing::debug!("Group {} is not registered, nothing to verify", group_id);
                return VerificationOutcome::from_resolutions(
                    user_id,
                    group_id,
                    Vec::new(),
                    self.elapsed_since(&started),
                );
            }
            Err(RegistryError::Unavailable(reason)) => {
                tracing::warn!(
                    "Registry unavailable for group {}, failing open: {}",
                    group_id,
                    reason
                );
                let outcome = VerificationOutcome {
                    user_id,
                    group_id,
                    verdict: Verdict::Degraded,
                    resolutions: Vec::new(),
                    admin_bypass: false,
                    elapsed: self.elapsed_since(&started),
                };
                self.finish(&outcome);
                return outcome;
            }
        };

        let request = VerificationRequest::new(user_id, group_id, channels);
        if request.is_trivially_satisfied() {
            let outcome = VerificationOutcome::from_resolutions(
                user_id,
                group_id,
                Vec::new(),
                self.elapsed_since(&started),
            );
            self.finish(&outcome);
            return outcome;
        }

        if self.is_admin(group_id, user_id).await {
            self.metrics.record_admin_bypass();
            tracing::debug!(
                "User {} administrates group {}, skipping channel checks",
                user_id,
                group_id
            );
            let outcome =
                VerificationOutcome::admin_bypass(user_id, group_id, self.elapsed_since(&started));
            self.finish(&outcome);
            return outcome;
        }

        let resolutions = self.resolve_all(&request).await;
        let outcome = VerificationOutcome::from_resolutions(
            user_id,
            group_id,
            resolutions,
            self.elapsed_since(&started),
        );
        self.finish(&outcome);
        outcome
    }

    /// Resolves every required channel under the request deadline.
    ///
    /// Results come back in completion order and are re-sorted into the
    /// configured channel order; channels still pending at the deadline
    /// become unresolved.
    async fn resolve_all(&self, request: &VerificationRequest) -> Vec<ChannelResolution> {
        let user_id = request.user_id;
        let mut pending = stream::iter(
            request
                .required_channels()
                .iter()
                .map(|&channel_id| self.resolve_channel(user_id, channel_id)),
        )
        .buffer_unordered(self.config.max_concurrent_checks);

        let deadline = tokio::time::sleep(self.config.request_deadline);
        tokio::pin!(deadline);

        let mut finished: HashMap<ChannelId, ChannelResolution> = HashMap::new();
        loop {
            tokio::select! {
                next = pending.next() => match next {
                    Some(resolution) => {
                        finished.insert(resolution.channel_id(), resolution);
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    tracing::warn!(
                        "Verification deadline of {:?} expired for user {} with {} of {} channels resolved",
                        self.config.request_deadline,
                        user_id,
                        finished.len(),
                        request.required_channels().len()
                    );
                    break;
                }
            }
        }

        request
            .required_channels()
            .iter()
            .map(|channel_id| {
                finished
                    .remove(channel_id)
                    .unwrap_or(ChannelResolution::Unresolved {
                        channel_id: *channel_id,
                        reason: UnresolvedReason::DeadlineExceeded,
                    })
            })
            .collect()
    }

    /// Resolves one channel: cache first, API on a miss.
    ///
    /// Cache failures count as misses; fresh API facts are written back
    /// with a TTL chosen by the cache policy.
    async fn resolve_channel(&self, user_id: UserId, channel_id: ChannelId) -> ChannelResolution {
        match self.cache.get(user_id, channel_id).await {
            Ok(Some(fact)) => {
                self.metrics.record_cache_hit();
                tracing::debug!("Cache hit for user {} in channel {}", user_id, channel_id);
                return ChannelResolution::Resolved {
                    channel_id,
                    is_member: fact.is_member,
                    source: fact.source,
                };
            }
            Ok(None) => {
                self.metrics.record_cache_miss();
            }
            Err(e) => {
                self.metrics.record_cache_miss();
                tracing::warn!(
                    "Cache read failed for user {} in channel {}, treating as miss: {}",
                    user_id,
                    channel_id,
                    e
                );
            }
        }

        match self.client.check(channel_id, user_id).await {
            Ok(fact) => {
                let ttl = self.config.cache_policy.ttl_for(fact.is_member);
                if let Err(e) = self.cache.put(fact, ttl).await {
                    tracing::warn!(
                        "Cache write failed for user {} in channel {}: {}",
                        user_id,
                        channel_id,
                        e
                    );
                }
                ChannelResolution::Resolved {
                    channel_id,
                    is_member: fact.is_member,
                    source: fact.source,
                }
            }
            Err(CheckError::ServiceUnavailable) => ChannelResolution::Unresolved {
                channel_id,
                reason: UnresolvedReason::CircuitOpen,
            },
            Err(CheckError::RateLimited) => ChannelResolution::Unresolved {
                channel_id,
                reason: UnresolvedReason::RateLimited,
            },
            Err(CheckError::Upstream(e)) => {
                tracing::warn!(
                    "Membership check failed for user {} in channel {}: {}",
                    user_id,
                    channel_id,
                    e
                );
                ChannelResolution::Unresolved {
                    channel_id,
                    reason: UnresolvedReason::Upstream,
                }
            }
        }
    }

    /// Registry errors never block verification; they just disable the
    /// bypass.
    async fn is_admin(&self, group_id: GroupId, user_id: UserId) -> bool {
        match self.registry.is_admin(group_id, user_id).await {
            Ok(is_admin) => is_admin,
            Err(e) => {
                tracing::warn!(
                    "Admin lookup failed for user {} in group {}, assuming non-admin: {}",
                    user_id,
                    group_id,
                    e
                );
                false
            }
        }
    }

    fn finish(&self, outcome: &VerificationOutcome) {
        self.metrics.record_verdict(outcome.verdict);
        tracing::info!(
            "Verdict for user {} in group {}: {:?} ({} missing, {} unresolved, {:?})",
            outcome.user_id,
            outcome.group_id,
            outcome.verdict,
            outcome.missing_channels().len(),
            outcome.unresolved_channels().len(),
            outcome.elapsed
        );
        self.audit.log(AuditRecord::VerdictIssued {
            event_id: EventId::new(),
            user_id: outcome.user_id,
            group_id: outcome.group_id,
            verdict: outcome.verdict,
            missing_channels: outcome.missing_channels(),
            unresolved_channels: outcome.unresolved_channels(),
            admin_bypass: outcome.admin_bypass,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
            occurred_at: self.clock.now(),
        });
    }

    fn elapsed_since(&self, started: &Timestamp) -> Duration {
        self.clock.now().saturating_duration_since(started)
    }
}

impl std::fmt::Debug for VerificationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
