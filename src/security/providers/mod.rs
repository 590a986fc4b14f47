//! External decision providers.
//!
//! Bot classification and attack-shield inspection are delegated to
//! collaborators outside this crate. Rules consume them only through the
//! contracts defined here.

pub mod remote;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use remote::RemoteDecisionClient;

/// Result of a bot classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotClassification {
    pub is_bot: bool,
    pub category: String,
    pub is_allowed_category: bool,
}

impl BotClassification {
    pub fn human() -> Self {
        Self {
            is_bot: false,
            category: String::new(),
            is_allowed_category: false,
        }
    }
}

/// Result of an attack-pattern inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldReport {
    pub is_attack: bool,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BotDecisionProvider: Send + Sync {
    async fn classify(
        &self,
        fingerprint: &str,
        headers: &HeaderMap,
    ) -> Result<BotClassification, ProviderError>;
}

#[async_trait]
pub trait ShieldDecisionProvider: Send + Sync {
    async fn inspect(
        &self,
        fingerprint: &str,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<ShieldReport, ProviderError>;
}
