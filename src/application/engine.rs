//! GateEngine - composition root and event driver.
//!
//! The builder wires configuration and ports into the orchestrator and
//! enforcement engine; `handle_event` is the one call the hosting bot
//! makes per incoming event. Every port has an override point so test
//! doubles and alternative backends slot in without touching the wiring.

use std::sync::Arc;

use tokio::sync::watch;

use crate::adapters::cache::InMemoryVerificationCache;
use crate::adapters::circuit_breaker::RollingWindowBreaker;
use crate::adapters::clock::SystemClock;
use crate::adapters::ledger::InMemoryRestrictionLedger;
use crate::adapters::rate_limiter::{TokenBucketConfig, TokenBucketLimiter};
use crate::domain::enforcement::EnforcementOutcome;
use crate::domain::foundation::{ChannelId, GroupId, UserId};
use crate::domain::verification::VerificationOutcome;
use crate::ports::{
    AuditSink, CircuitBreaker, CircuitBreakerConfig, Clock, GroupRegistry, MembershipApi,
    ModerationApi, RateLimiter, RestrictionLedger, VerificationCache,
};

use super::audit::{AuditDrain, AuditLogger, AuditLoggerConfig};
use super::enforcement::{EnforcementEngine, EnforcementError};
use super::membership_client::{MembershipClient, MembershipClientConfig};
use super::metrics::{EngineMetrics, MetricsSnapshot};
use super::orchestrator::{VerificationConfig, VerificationOrchestrator};

/// An event in a protected group that the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    /// A user posted a message.
    Message { group_id: GroupId, user_id: UserId },

    /// A user joined the group.
    Joined { group_id: GroupId, user_id: UserId },

    /// A user asked to be re-verified, typically after joining the
    /// required channels.
    VerifyRequested { group_id: GroupId, user_id: UserId },

    /// The membership API reported a change for one (user, channel) pair.
    MembershipChanged {
        user_id: UserId,
        channel_id: ChannelId,
    },
}

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event triggered a verification pass and its enforcement.
    Verified {
        verification: VerificationOutcome,
        enforcement: EnforcementOutcome,
    },

    /// The event only touched the cache.
    CacheInvalidated,
}

/// Errors surfaced to the event loop.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Enforcement(#[from] EnforcementError),
}

/// A required piece was never provided to the builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing required component: {0}")]
    Missing(&'static str),
}

/// Verification and enforcement behind a single `handle_event` call.
pub struct GateEngine {
    orchestrator: VerificationOrchestrator,
    enforcement: EnforcementEngine,
    registry: Arc<dyn GroupRegistry>,
    cache: Arc<dyn VerificationCache>,
    metrics: Arc<EngineMetrics>,
    shutdown_tx: watch::Sender<bool>,
    drain: AuditDrain,
}

impl GateEngine {
    pub fn builder() -> GateEngineBuilder {
        GateEngineBuilder::default()
    }

    /// Reacts to one event.
    ///
    /// Message and join events verify and enforce. A re-verification
    /// request drops the user's cached negatives first so the pass hits
    /// the API for exactly the channels that previously failed. A
    /// membership-change signal only invalidates the affected cache key;
    /// the next event for that user picks up the fresh state.
    pub async fn handle_event(&self, event: GateEvent) -> Result<EventOutcome, EngineError> {
        match event {
            GateEvent::Message { group_id, user_id } | GateEvent::Joined { group_id, user_id } => {
                self.verify_and_enforce(group_id, user_id).await
            }
            GateEvent::VerifyRequested { group_id, user_id } => {
                self.invalidate_negatives(group_id, user_id).await;
                self.verify_and_enforce(group_id, user_id).await
            }
            GateEvent::MembershipChanged {
                user_id,
                channel_id,
            } => {
                if let Err(e) = self.cache.invalidate(user_id, channel_id).await {
                    tracing::warn!(
                        "Failed to invalidate cache for user {} in channel {}: {}",
                        user_id,
                        channel_id,
                        e
                    );
                }
                Ok(EventOutcome::CacheInvalidated)
            }
        }
    }

    /// Point-in-time view of the engine counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stops accepting audit records and waits for the queue to drain.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        self.drain.wait().await;
    }

    async fn verify_and_enforce(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<EventOutcome, EngineError> {
        let verification = self.orchestrator.verify(group_id, user_id).await;
        let enforcement = self.enforcement.apply(&verification).await?;
        Ok(EventOutcome::Verified {
            verification,
            enforcement,
        })
    }

    /// Drops cached non-membership facts so a re-verification pass asks
    /// the API again. Positive facts stay; they can only have improved.
    async fn invalidate_negatives(&self, group_id: GroupId, user_id: UserId) {
        let channels = match self.registry.required_channels(group_id).await {
            Ok(channels) => channels,
            Err(_) => return,
        };
        for channel_id in channels {
            let cached = match self.cache.get(user_id, channel_id).await {
                Ok(Some(fact)) if !fact.is_member => fact,
                _ => continue,
            };
            if let Err(e) = self.cache.invalidate(cached.user_id, cached.channel_id).await {
                tracing::warn!(
                    "Failed to drop stale negative for user {} in channel {}: {}",
                    user_id,
                    channel_id,
                    e
                );
            }
        }
    }
}

impl std::fmt::Debug for GateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateEngine").finish_non_exhaustive()
    }
}

/// Builder for [`GateEngine`].
///
/// The membership API, moderation API, and group registry have no
/// default and must be provided; everything else falls back to the
/// in-process adapters.
#[derive(Default)]
pub struct GateEngineBuilder {
    membership_api: Option<Arc<dyn MembershipApi>>,
    moderation_api: Option<Arc<dyn ModerationApi>>,
    registry: Option<Arc<dyn GroupRegistry>>,
    cache: Option<Arc<dyn VerificationCache>>,
    ledger: Option<Arc<dyn RestrictionLedger>>,
    audit_sink: Option<Arc<dyn AuditSink>>,
    limiter: Option<Arc<dyn RateLimiter>>,
    breaker: Option<Arc<dyn CircuitBreaker>>,
    clock: Option<Arc<dyn Clock>>,
    limiter_config: TokenBucketConfig,
    breaker_config: Option<CircuitBreakerConfig>,
    client_config: MembershipClientConfig,
    verification_config: VerificationConfig,
    audit_config: AuditLoggerConfig,
}

impl GateEngineBuilder {
    pub fn membership_api(mut self, api: Arc<dyn MembershipApi>) -> Self {
        self.membership_api = Some(api);
        self
    }

    pub fn moderation_api(mut self, api: Arc<dyn ModerationApi>) -> Self {
        self.moderation_api = Some(api);
        self
    }

    pub fn registry(mut self, registry: Arc<dyn GroupRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn VerificationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn RestrictionLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn circuit_breaker(mut self, breaker: Arc<dyn CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn limiter_config(mut self, config: TokenBucketConfig) -> Self {
        self.limiter_config = config;
        self
    }

    pub fn breaker_config(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker_config = Some(config);
        self
    }

    pub fn client_config(mut self, config: MembershipClientConfig) -> Self {
        self.client_config = config;
        self
    }

    pub fn verification_config(mut self, config: VerificationConfig) -> Self {
        self.verification_config = config;
        self
    }

    pub fn audit_config(mut self, config: AuditLoggerConfig) -> Self {
        self.audit_config = config;
        self
    }

    /// Wires everything together, filling unset pieces with in-process
    /// defaults.
    pub fn build(self) -> Result<GateEngine, BuildError> {
        let membership_api = self
            .membership_api
            .ok_or(BuildError::Missing("membership API"))?;
        let moderation_api = self
            .moderation_api
            .ok_or(BuildError::Missing("moderation API"))?;
        let registry = self.registry.ok_or(BuildError::Missing("group registry"))?;

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache: Arc<dyn VerificationCache> = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryVerificationCache::new(clock.clone())));
        let ledger: Arc<dyn RestrictionLedger> = self
            .ledger
            .unwrap_or_else(|| Arc::new(InMemoryRestrictionLedger::new()));
        let audit_sink: Arc<dyn AuditSink> = self
            .audit_sink
            .unwrap_or_else(|| Arc::new(crate::adapters::audit::InMemoryAuditSink::new()));
        let limiter: Arc<dyn RateLimiter> = self.limiter.unwrap_or_else(|| {
            Arc::new(TokenBucketLimiter::with_config(
                self.limiter_config,
                clock.clone(),
            ))
        });
        let breaker: Arc<dyn CircuitBreaker> = self.breaker.unwrap_or_else(|| {
            let config = self
                .breaker_config
                .unwrap_or_else(CircuitBreakerConfig::for_membership_api);
            Arc::new(RollingWindowBreaker::with_config(config, clock.clone()))
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (audit, drain) = AuditLogger::spawn(audit_sink, self.audit_config, shutdown_rx);
        let metrics = Arc::new(EngineMetrics::new());

        let client = Arc::new(MembershipClient::new(
            membership_api,
            limiter,
            breaker,
            clock.clone(),
            audit.clone(),
            metrics.clone(),
            self.client_config,
        ));

        let orchestrator = VerificationOrchestrator::new(
            registry.clone(),
            cache.clone(),
            client,
            clock.clone(),
            audit.clone(),
            metrics.clone(),
            self.verification_config,
        );

        let enforcement = EnforcementEngine::new(
            moderation_api,
            ledger,
            clock,
            audit,
            metrics.clone(),
        );

        Ok(GateEngine {
            orchestrator,
            enforcement,
            registry,
            cache,
            metrics,
            shutdown_tx,
            drain,
        })
    }
}

impl std::fmt::Debug for GateEngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateEngineBuilder")
            .field("limiter_config", &self.limiter_config)
            .field("client_config", &self.client_config)
            .field("verification_config", &self.verification_config)
            .field("audit_config", &self.audit_config)
            .finish_non_exhaustive()
    }
}
