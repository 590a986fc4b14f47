//! Single admission entry point.
//!
//! Takes the request metadata the HTTP layer hands over, resolves the
//! caller, looks up the role's rules and runs them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, Method};

use crate::config::GateConfig;
use crate::observability::metrics;
use crate::security::decision::Decision;
use crate::security::engine::RuleEngine;
use crate::security::identity::{IdentityResolver, Role};
use crate::security::policy::{PolicyRegistry, Providers};
use crate::security::rate_limit::SlidingWindowLimiter;
use crate::security::rules::RequestContext;

/// Request metadata consumed by the gate.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
    pub role: Option<Role>,
}

pub struct AdmissionController {
    resolver: IdentityResolver,
    registry: PolicyRegistry,
    engine: RuleEngine,
    test_mode: bool,
}

impl AdmissionController {
    pub fn new(
        resolver: IdentityResolver,
        registry: PolicyRegistry,
        engine: RuleEngine,
        test_mode: bool,
    ) -> Self {
        Self {
            resolver,
            registry,
            engine,
            test_mode,
        }
    }

    pub fn from_config(
        config: &GateConfig,
        limiter: Arc<SlidingWindowLimiter>,
        providers: &Providers,
    ) -> Self {
        Self::new(
            IdentityResolver::new(config.admission.trust_forwarded_for),
            PolicyRegistry::from_config(config, limiter, providers),
            RuleEngine::new(Duration::from_millis(config.admission.rule_timeout_ms)),
            config.admission.test_mode,
        )
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub async fn admit(&self, request: AdmissionRequest) -> Decision {
        if self.test_mode {
            return Decision::allow();
        }

        let identity = self
            .resolver
            .resolve(request.remote_addr, &request.headers, request.role);

        let Some(rules) = self.registry.policy_for(identity.role) else {
            tracing::error!(role = %identity.role, "No policy registered for role");
            metrics::record_decision(Decision::internal_error().reason, identity.role);
            return Decision::internal_error();
        };

        let context = RequestContext {
            method: request.method,
            url: request.url,
            headers: request.headers,
        };
        let decision = self.engine.evaluate(&identity, &context, rules).await;
        metrics::record_decision(decision.reason, identity.role);
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::clock::MockClock;
    use crate::security::decision::ReasonKind;
    use std::collections::HashMap;

    fn request(role: Option<Role>) -> AdmissionRequest {
        AdmissionRequest {
            method: Method::GET,
            url: "/".into(),
            headers: HeaderMap::new(),
            remote_addr: Some("198.51.100.4:443".parse().unwrap()),
            role,
        }
    }

    fn controller(config: &GateConfig) -> (AdmissionController, Arc<SlidingWindowLimiter>) {
        let clock = MockClock::new(Duration::from_secs(1));
        let limiter = Arc::new(SlidingWindowLimiter::new(Arc::new(clock)));
        let controller =
            AdmissionController::from_config(config, Arc::clone(&limiter), &Providers::default());
        (controller, limiter)
    }

    #[tokio::test]
    async fn test_guest_budget() {
        let (controller, _) = controller(&GateConfig::default());
        for _ in 0..5 {
            assert!(controller.admit(request(None)).await.allowed);
        }
        let decision = controller.admit(request(None)).await;
        assert_eq!(decision.reason, ReasonKind::RateLimit);
    }

    #[tokio::test]
    async fn test_admin_budget_is_larger() {
        let (controller, _) = controller(&GateConfig::default());
        for _ in 0..20 {
            assert!(controller.admit(request(Some(Role::Admin))).await.allowed);
        }
        assert!(!controller.admit(request(Some(Role::Admin))).await.allowed);
    }

    #[tokio::test]
    async fn test_test_mode_skips_rules() {
        let mut config = GateConfig::default();
        config.admission.test_mode = true;
        let (controller, limiter) = controller(&config);

        for _ in 0..50 {
            assert!(controller.admit(request(None)).await.allowed);
        }
        assert!(limiter.is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_role_fails_closed() {
        let controller = AdmissionController::new(
            IdentityResolver::default(),
            PolicyRegistry::new(HashMap::new()),
            RuleEngine::new(Duration::from_secs(1)),
            false,
        );
        let decision = controller.admit(request(Some(Role::Teacher))).await;
        assert_eq!(decision, Decision::internal_error());
    }
}
