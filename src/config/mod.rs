//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → role budgets bound into the PolicyRegistry at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AdmissionConfig, BotConfig, GateConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProviderConfig, ProviderMode, RoleLimit, RoleLimitsConfig, RuleMode, RuleModesConfig,
};
