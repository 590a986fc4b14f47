//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (budgets > 0, timeouts > 0)
//! - Check addresses and provider URL parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GateConfig, ProviderMode};
use crate::security::identity::Role;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("roles.{role}: max_requests must be greater than zero")]
    ZeroBudget { role: Role },

    #[error("roles.{role}: window_secs must be greater than zero")]
    ZeroWindow { role: Role },

    #[error("{field}: '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("admission.rule_timeout_ms must be greater than zero")]
    ZeroRuleTimeout,

    #[error("admission.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,

    #[error("providers.base_url: {0}")]
    InvalidProviderUrl(String),

    #[error("providers.api_key is required when the remote provider is enabled")]
    MissingProviderKey,
}

pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for role in Role::ALL {
        let limit = config.roles.for_role(role);
        if limit.max_requests == 0 {
            errors.push(ValidationError::ZeroBudget { role });
        }
        if limit.window_secs == 0 {
            errors.push(ValidationError::ZeroWindow { role });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.admission.rule_timeout_ms == 0 {
        errors.push(ValidationError::ZeroRuleTimeout);
    }
    if config.admission.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if config.providers.mode == ProviderMode::Remote {
        match Url::parse(&config.providers.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidProviderUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            ))),
            Err(e) => errors.push(ValidationError::InvalidProviderUrl(e.to_string())),
        }

        let has_key = config
            .providers
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key && !config.admission.test_mode {
            errors.push(ValidationError::MissingProviderKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
