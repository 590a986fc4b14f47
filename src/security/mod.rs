//! Security subsystem: the admission decision.
//!
//! # Data Flow
//! ```text
//! Incoming request metadata:
//!     → identity.rs (fingerprint + role)
//!     → policy.rs (role → ordered rules)
//!     → engine.rs (bot → shield → rate limit, first denial wins)
//!         → providers/ (external bot & shield decisions)
//!         → rate_limit.rs (sliding-window counters)
//!     → decision.rs (Decision handed back to the HTTP layer)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a faulting rule denies with an internal error
//! - Fail open only in explicit test mode
//! - Policies are data built once at startup, never per request

pub mod admission;
pub mod clock;
pub mod decision;
pub mod engine;
pub mod identity;
pub mod policy;
pub mod providers;
pub mod rate_limit;
pub mod rules;

pub use admission::{AdmissionController, AdmissionRequest};
pub use decision::{Decision, ReasonKind, Verdict};
pub use identity::{AuthenticatedRole, Identity, IdentityResolver, Role};
pub use policy::{PolicyRegistry, Providers, RulePolicy};
pub use rate_limit::SlidingWindowLimiter;
