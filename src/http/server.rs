//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the admission controller and its collaborators from config
//! - Create the Axum Router with admission in front of the handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run the idle-window sweeper alongside the server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GateConfig, ProviderMode};
use crate::http::middleware::{admission_middleware, role_header_middleware};
use crate::security::admission::AdmissionController;
use crate::security::policy::Providers;
use crate::security::providers::{ProviderError, RemoteDecisionClient};
use crate::security::rate_limit::SlidingWindowLimiter;

/// Build the configured decision providers.
pub fn providers_from_config(config: &GateConfig) -> Result<Providers, ProviderError> {
    match config.providers.mode {
        ProviderMode::Disabled => Ok(Providers::default()),
        ProviderMode::Remote => {
            let client = Arc::new(RemoteDecisionClient::new(
                &config.providers.base_url,
                config.providers.api_key.clone(),
                Duration::from_millis(config.providers.timeout_ms),
            )?);
            Ok(Providers {
                bot: Some(client.clone()),
                shield: Some(client),
            })
        }
    }
}

/// HTTP server fronted by the admission gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    limiter: Arc<SlidingWindowLimiter>,
}

impl HttpServer {
    /// Create a server with a system clock and the configured providers.
    pub fn new(config: GateConfig) -> Result<Self, ProviderError> {
        let providers = providers_from_config(&config)?;
        Ok(Self::with_parts(
            config,
            Arc::new(SlidingWindowLimiter::default()),
            providers,
        ))
    }

    /// Create a server around an existing limiter and providers.
    pub fn with_parts(
        config: GateConfig,
        limiter: Arc<SlidingWindowLimiter>,
        providers: Providers,
    ) -> Self {
        let controller = Arc::new(AdmissionController::from_config(
            &config,
            Arc::clone(&limiter),
            &providers,
        ));
        let router = Self::build_router(&config, controller);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GateConfig, controller: Arc<AdmissionController>) -> Router {
        let mut admitted = Router::new()
            .route("/", get(root_handler))
            .layer(from_fn_with_state(controller, admission_middleware));

        if let Some(name) = &config.admission.role_header {
            match HeaderName::try_from(name.as_str()) {
                Ok(header) => {
                    admitted = admitted.layer(from_fn_with_state(header, role_header_middleware));
                }
                Err(e) => {
                    tracing::error!(header = %name, error = %e, "Ignoring invalid role header name");
                }
            }
        }

        Router::new()
            .route("/health", get(health_handler))
            .merge(admitted)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Router for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            test_mode = self.config.admission.test_mode,
            providers = ?self.config.providers.mode,
            "HTTP server starting"
        );

        let sweeper = self.limiter.spawn_sweeper(
            Duration::from_secs(self.config.admission.sweep_interval_secs),
            shutdown.resubscribe(),
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Window sweeper ended abnormally");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Hello from behind the admission gate" }))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
