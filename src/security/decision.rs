//! Rule verdicts and the aggregated admission decision.

use std::fmt;

use serde::Serialize;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    #[default]
    None,
    Bot,
    Shield,
    RateLimit,
    InternalError,
}

impl ReasonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonKind::None => "none",
            ReasonKind::Bot => "bot",
            ReasonKind::Shield => "shield",
            ReasonKind::RateLimit => "rate_limit",
            ReasonKind::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ReasonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one security rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: ReasonKind,
    pub message: String,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: ReasonKind::None,
            message: String::new(),
        }
    }

    pub fn deny(reason: ReasonKind, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason,
            message: message.into(),
        }
    }
}

/// Aggregated outcome of every rule for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: ReasonKind,
    pub message: String,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: ReasonKind::None,
            message: String::new(),
        }
    }

    pub fn internal_error() -> Self {
        Self {
            allowed: false,
            reason: ReasonKind::InternalError,
            message: "Something went wrong with the security checks".to_string(),
        }
    }
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        Self {
            allowed: verdict.allowed,
            reason: verdict.reason,
            message: verdict.message,
        }
    }
}
