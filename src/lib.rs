//! Request admission control for HTTP services.
//!
//! Resolves the caller, applies role-specific bot, shield and sliding-window
//! rate-limit rules, and produces one allow/deny decision per request.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::{AdmissionController, Decision, ReasonKind};
