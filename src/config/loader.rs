//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that forces test mode when set to `test`.
pub const APP_ENV_VAR: &str = "APP_ENV";
/// Environment variable carrying the decision provider key.
pub const PROVIDER_KEY_VAR: &str = "ADMISSION_PROVIDER_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GateConfig = toml::from_str(&content)?;
    finalize(config)
}

/// Apply environment overrides and validate.
pub fn finalize(mut config: GateConfig) -> Result<GateConfig, ConfigError> {
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut GateConfig, lookup: impl Fn(&str) -> Option<String>) {
    if lookup(APP_ENV_VAR).is_some_and(|v| v.eq_ignore_ascii_case("test")) {
        config.admission.test_mode = true;
    }
    if let Some(key) = lookup(PROVIDER_KEY_VAR).filter(|k| !k.is_empty()) {
        config.providers.api_key = Some(key);
    }
}
