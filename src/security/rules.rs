//! Security rules.
//!
//! A rule inspects the resolved identity and request context and returns a
//! [`Verdict`]. Rules hold no request state; the only mutation any of them
//! performs is the counter update inside [`SlidingWindowLimiter`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method};
use thiserror::Error;

use crate::config::RuleMode;
use crate::security::decision::{ReasonKind, Verdict};
use crate::security::identity::Identity;
use crate::security::policy::RulePolicy;
use crate::security::providers::{BotDecisionProvider, ProviderError, ShieldDecisionProvider};
use crate::security::rate_limit::{LimiterError, SlidingWindowLimiter};

pub const BOT_DENIED_MESSAGE: &str = "Automated requests are not allowed.";
pub const SHIELD_DENIED_MESSAGE: &str = "Request blocked by security policy.";

/// Request data the rules may look at.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Path and query as received.
    pub url: String,
    pub headers: HeaderMap,
}

/// A fault that kept a rule from reaching a verdict.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Limiter(#[from] LimiterError),

    #[error("rule '{rule}' did not finish within {after:?}")]
    Timeout { rule: &'static str, after: Duration },

    #[error("rule '{rule}' panicked")]
    Panicked { rule: &'static str },
}

#[async_trait]
pub trait SecurityRule: Send + Sync {
    /// Stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    fn mode(&self) -> RuleMode {
        RuleMode::Live
    }

    async fn evaluate(
        &self,
        identity: &Identity,
        context: &RequestContext,
    ) -> Result<Verdict, RuleError>;
}

/// Per-role request budget over a sliding window.
pub struct RateLimitRule {
    policy: RulePolicy,
    limiter: Arc<SlidingWindowLimiter>,
    mode: RuleMode,
}

impl RateLimitRule {
    pub fn new(policy: RulePolicy, limiter: Arc<SlidingWindowLimiter>, mode: RuleMode) -> Self {
        Self {
            policy,
            limiter,
            mode,
        }
    }

    pub fn policy(&self) -> &RulePolicy {
        &self.policy
    }
}

#[async_trait]
impl SecurityRule for RateLimitRule {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn mode(&self) -> RuleMode {
        self.mode
    }

    async fn evaluate(
        &self,
        identity: &Identity,
        _context: &RequestContext,
    ) -> Result<Verdict, RuleError> {
        let observation = self.limiter.observe(&identity.fingerprint, &self.policy)?;
        if observation.allowed {
            tracing::debug!(
                client = %identity.fingerprint,
                role = %self.policy.role,
                remaining = observation.remaining,
                "Within rate budget"
            );
            Ok(Verdict::allow())
        } else {
            Ok(Verdict::deny(ReasonKind::RateLimit, self.policy.limit_message()))
        }
    }
}

/// Denies bots outside the allowed categories.
pub struct BotClassificationRule {
    provider: Arc<dyn BotDecisionProvider>,
    allowed_categories: Arc<HashSet<String>>,
    mode: RuleMode,
}

impl BotClassificationRule {
    pub fn new(
        provider: Arc<dyn BotDecisionProvider>,
        allowed_categories: Arc<HashSet<String>>,
        mode: RuleMode,
    ) -> Self {
        Self {
            provider,
            allowed_categories,
            mode,
        }
    }
}

#[async_trait]
impl SecurityRule for BotClassificationRule {
    fn name(&self) -> &'static str {
        "bot"
    }

    fn mode(&self) -> RuleMode {
        self.mode
    }

    async fn evaluate(
        &self,
        identity: &Identity,
        context: &RequestContext,
    ) -> Result<Verdict, RuleError> {
        let classification = self
            .provider
            .classify(&identity.fingerprint, &context.headers)
            .await?;

        let admitted = !classification.is_bot
            || classification.is_allowed_category
            || self.allowed_categories.contains(&classification.category);

        if admitted {
            Ok(Verdict::allow())
        } else {
            tracing::debug!(
                client = %identity.fingerprint,
                category = %classification.category,
                "Bot outside allowed categories"
            );
            Ok(Verdict::deny(ReasonKind::Bot, BOT_DENIED_MESSAGE))
        }
    }
}

/// Denies requests the attack-pattern provider flags.
pub struct ShieldHeuristicRule {
    provider: Arc<dyn ShieldDecisionProvider>,
    mode: RuleMode,
}

impl ShieldHeuristicRule {
    pub fn new(provider: Arc<dyn ShieldDecisionProvider>, mode: RuleMode) -> Self {
        Self { provider, mode }
    }
}

#[async_trait]
impl SecurityRule for ShieldHeuristicRule {
    fn name(&self) -> &'static str {
        "shield"
    }

    fn mode(&self) -> RuleMode {
        self.mode
    }

    async fn evaluate(
        &self,
        identity: &Identity,
        context: &RequestContext,
    ) -> Result<Verdict, RuleError> {
        let report = self
            .provider
            .inspect(
                &identity.fingerprint,
                &context.method,
                &context.url,
                &context.headers,
            )
            .await?;

        if report.is_attack {
            Ok(Verdict::deny(ReasonKind::Shield, SHIELD_DENIED_MESSAGE))
        } else {
            Ok(Verdict::allow())
        }
    }
}
