//! Caller identity resolution.
//!
//! # Responsibilities
//! - Derive a stable fingerprint from the caller's network address
//! - Pick up the role attached by the upstream authentication layer
//!
//! # Design Decisions
//! - Never fails: a missing role is `guest`, a missing address is the
//!   sentinel fingerprint `0.0.0.0`
//! - Fingerprints are derived, never copied from a client-supplied field
//!   unless forwarded addresses are explicitly trusted

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Fingerprint used when no usable address is available.
pub const SENTINEL_FINGERPRINT: &str = "0.0.0.0";

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Caller role as resolved by the authentication layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Guest, Role::Student, Role::Teacher, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Capitalised name for user-facing messages.
    pub fn title(&self) -> &'static str {
        match self {
            Role::Guest => "Guest",
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Request extension inserted by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedRole(pub Role);

/// Resolved caller identity, immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub fingerprint: String,
    pub role: Role,
}

/// Derives [`Identity`] from raw request metadata.
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    trust_forwarded_for: bool,
}

impl IdentityResolver {
    pub fn new(trust_forwarded_for: bool) -> Self {
        Self { trust_forwarded_for }
    }

    pub fn resolve(
        &self,
        remote_addr: Option<SocketAddr>,
        headers: &HeaderMap,
        role: Option<Role>,
    ) -> Identity {
        let forwarded = if self.trust_forwarded_for {
            forwarded_ip(headers)
        } else {
            None
        };

        let fingerprint = forwarded
            .or_else(|| remote_addr.map(|a| a.ip()))
            .map(fingerprint_for)
            .unwrap_or_else(|| SENTINEL_FINGERPRINT.to_string());

        Identity {
            fingerprint,
            role: role.unwrap_or_default(),
        }
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let raw = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    raw.split(',').next()?.trim().parse().ok()
}

fn fingerprint_for(ip: IpAddr) -> String {
    let ip = ip.to_canonical();
    if ip.is_unspecified() {
        return Ipv4Addr::UNSPECIFIED.to_string();
    }
    ip.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr(s: &str) -> Option<SocketAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_defaults_to_guest() {
        let resolver = IdentityResolver::default();
        let id = resolver.resolve(addr("10.0.0.7:5000"), &HeaderMap::new(), None);
        assert_eq!(id.role, Role::Guest);
        assert_eq!(id.fingerprint, "10.0.0.7");
    }

    #[test]
    fn test_missing_address_uses_sentinel() {
        let resolver = IdentityResolver::default();
        let id = resolver.resolve(None, &HeaderMap::new(), Some(Role::Teacher));
        assert_eq!(id.fingerprint, SENTINEL_FINGERPRINT);
        assert_eq!(id.role, Role::Teacher);
    }

    #[test]
    fn test_port_does_not_change_fingerprint() {
        let resolver = IdentityResolver::default();
        let a = resolver.resolve(addr("10.0.0.7:5000"), &HeaderMap::new(), None);
        let b = resolver.resolve(addr("10.0.0.7:6000"), &HeaderMap::new(), None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_ipv4_mapped_is_canonicalised() {
        let resolver = IdentityResolver::default();
        let id = resolver.resolve(addr("[::ffff:192.168.1.4]:80"), &HeaderMap::new(), None);
        assert_eq!(id.fingerprint, "192.168.1.4");
    }

    #[test]
    fn test_forwarded_for_only_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.9, 10.0.0.1"));

        let untrusted = IdentityResolver::new(false).resolve(addr("10.0.0.1:1"), &headers, None);
        assert_eq!(untrusted.fingerprint, "10.0.0.1");

        let trusted = IdentityResolver::new(true).resolve(addr("10.0.0.1:1"), &headers, None);
        assert_eq!(trusted.fingerprint, "203.0.113.9");
    }

    #[test]
    fn test_garbage_forwarded_for_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("not-an-ip"));

        let id = IdentityResolver::new(true).resolve(None, &headers, None);
        assert_eq!(id.fingerprint, SENTINEL_FINGERPRINT);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" student ".parse::<Role>(), Ok(Role::Student));
        assert!("root".parse::<Role>().is_err());
    }
}
