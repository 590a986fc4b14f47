//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use admission_gate::config::GateConfig;
use admission_gate::http::HttpServer;
use admission_gate::security::clock::MockClock;
use admission_gate::security::providers::{
    BotClassification, BotDecisionProvider, ProviderError, ShieldDecisionProvider, ShieldReport,
};
use admission_gate::security::{AuthenticatedRole, Providers, Role, SlidingWindowLimiter};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

/// Bot provider with a canned answer and a call counter.
pub struct StubBot {
    pub answer: BotClassification,
    pub delay: Option<Duration>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubBot {
    pub fn human() -> Arc<Self> {
        Self::answering(BotClassification::human())
    }

    pub fn answering(answer: BotClassification) -> Arc<Self> {
        Arc::new(Self {
            answer,
            delay: None,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn scraper() -> Arc<Self> {
        Self::answering(BotClassification {
            is_bot: true,
            category: "CATEGORY:SCRAPER".into(),
            is_allowed_category: false,
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            answer: BotClassification::human(),
            delay: Some(delay),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: BotClassification::human(),
            delay: None,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotDecisionProvider for StubBot {
    async fn classify(&self, _: &str, _: &HeaderMap) -> Result<BotClassification, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ProviderError::Unavailable("bot provider down".into()));
        }
        Ok(self.answer.clone())
    }
}

/// Shield provider flagging URLs containing a marker.
pub struct StubShield {
    pub marker: &'static str,
    pub calls: AtomicUsize,
}

impl StubShield {
    pub fn flagging(marker: &'static str) -> Arc<Self> {
        Arc::new(Self {
            marker,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShieldDecisionProvider for StubShield {
    async fn inspect(
        &self,
        _: &str,
        _: &Method,
        url: &str,
        _: &HeaderMap,
    ) -> Result<ShieldReport, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ShieldReport {
            is_attack: url.contains(self.marker),
        })
    }
}

pub struct Harness {
    pub router: Router,
    pub clock: MockClock,
    pub limiter: Arc<SlidingWindowLimiter>,
}

/// In-process gate with a controllable clock.
pub fn harness(config: GateConfig, bot: Arc<StubBot>, shield: Arc<StubShield>) -> Harness {
    let clock = MockClock::new(Duration::ZERO);
    let limiter = Arc::new(SlidingWindowLimiter::new(Arc::new(clock.clone())));
    harness_on(clock, limiter, config, bot, shield)
}

/// In-process gate over an existing clock and limiter.
pub fn harness_on(
    clock: MockClock,
    limiter: Arc<SlidingWindowLimiter>,
    config: GateConfig,
    bot: Arc<StubBot>,
    shield: Arc<StubShield>,
) -> Harness {
    let providers = Providers {
        bot: Some(bot),
        shield: Some(shield),
    };
    let server = HttpServer::with_parts(config, Arc::clone(&limiter), providers);
    Harness {
        router: server.router(),
        clock,
        limiter,
    }
}

pub fn get(path: &str, client: &str, role: Option<Role>) -> Request<Body> {
    let addr: SocketAddr = format!("{}:40000", client).parse().unwrap();
    let mut request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    if let Some(role) = role {
        request.extensions_mut().insert(AuthenticatedRole(role));
    }
    request
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
