//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Rule evaluation that waits on a provider:
//!     → timeouts.rs (enforce deadline, cancel on expiry)
//!     → expired deadline surfaces as a rule fault (fail closed)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries inside the admission path; callers retry blocked requests

pub mod timeouts;
