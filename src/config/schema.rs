//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::security::identity::Role;

/// Root configuration for the admission gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Admission pipeline behaviour.
    pub admission: AdmissionConfig,

    /// Per-role rate budgets.
    pub roles: RoleLimitsConfig,

    /// Enforcement mode for each rule kind.
    pub rules: RuleModesConfig,

    /// Bot classification settings.
    pub bot: BotConfig,

    /// External decision providers.
    pub providers: ProviderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Admission pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Bypass every rule and admit all requests (test suites only).
    pub test_mode: bool,

    /// Deadline for a single rule evaluation in milliseconds.
    pub rule_timeout_ms: u64,

    /// How often idle window entries are swept, in seconds.
    pub sweep_interval_secs: u64,

    /// Use the first `X-Forwarded-For` entry as the caller address.
    pub trust_forwarded_for: bool,

    /// Header set by a fronting auth proxy carrying the resolved role.
    pub role_header: Option<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            rule_timeout_ms: 2_000,
            sweep_interval_secs: 60,
            trust_forwarded_for: false,
            role_header: None,
        }
    }
}

/// A single role's rate budget.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoleLimit {
    /// Maximum requests admitted per window.
    pub max_requests: u64,

    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_window_secs() -> u64 {
    60
}

impl RoleLimit {
    pub const fn per_minute(max_requests: u64) -> Self {
        Self {
            max_requests,
            window_secs: 60,
        }
    }
}

/// Rate budgets for every role.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoleLimitsConfig {
    pub admin: RoleLimit,
    pub teacher: RoleLimit,
    pub student: RoleLimit,
    pub guest: RoleLimit,
}

impl RoleLimitsConfig {
    /// Budget configured for `role`.
    pub fn for_role(&self, role: Role) -> RoleLimit {
        match role {
            Role::Admin => self.admin,
            Role::Teacher => self.teacher,
            Role::Student => self.student,
            Role::Guest => self.guest,
        }
    }
}

impl Default for RoleLimitsConfig {
    fn default() -> Self {
        Self {
            admin: RoleLimit::per_minute(20),
            teacher: RoleLimit::per_minute(10),
            student: RoleLimit::per_minute(10),
            guest: RoleLimit::per_minute(5),
        }
    }
}

/// Whether a rule's denials are enforced or only reported.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    #[default]
    Live,
    DryRun,
}

/// Enforcement mode per rule kind.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleModesConfig {
    pub bot: RuleMode,
    pub shield: RuleMode,
    pub rate_limit: RuleMode,
}

/// Bot classification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot categories that are admitted even when the caller is a bot.
    pub allowed_categories: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            allowed_categories: vec![
                "CATEGORY:SEARCH_ENGINE".to_string(),
                "CATEGORY:PREVIEW".to_string(),
            ],
        }
    }
}

/// Where bot and shield decisions come from.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderMode {
    /// No provider; only the rate-limit rule runs.
    #[default]
    Disabled,
    /// Remote decision service over HTTP.
    Remote,
}

/// External decision provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub mode: ProviderMode,

    /// Base URL of the decision service (e.g., "https://decide.internal").
    pub base_url: String,

    /// Bearer key for the decision service.
    pub api_key: Option<String>,

    /// Transport timeout for provider calls in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            mode: ProviderMode::Disabled,
            base_url: String::new(),
            api_key: None,
            timeout_ms: 1_500,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: GateConfig = toml::from_str("").unwrap();
        assert_eq!(config.roles.admin, RoleLimit::per_minute(20));
        assert_eq!(config.roles.teacher, RoleLimit::per_minute(10));
        assert_eq!(config.roles.student, RoleLimit::per_minute(10));
        assert_eq!(config.roles.guest, RoleLimit::per_minute(5));
        assert_eq!(config.providers.mode, ProviderMode::Disabled);
        assert!(!config.admission.test_mode);
    }

    #[test]
    fn test_partial_override() {
        let config: GateConfig = toml::from_str(
            r#"
            [roles.guest]
            max_requests = 2

            [rules]
            bot = "dry_run"

            [providers]
            mode = "remote"
            base_url = "http://127.0.0.1:9999"
            "#,
        )
        .unwrap();

        assert_eq!(config.roles.guest, RoleLimit { max_requests: 2, window_secs: 60 });
        assert_eq!(config.roles.admin.max_requests, 20);
        assert_eq!(config.rules.bot, RuleMode::DryRun);
        assert_eq!(config.rules.shield, RuleMode::Live);
        assert_eq!(config.providers.mode, ProviderMode::Remote);
        assert_eq!(config.providers.timeout_ms, 1_500);
    }
}
