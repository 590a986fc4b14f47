//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → middleware/role.rs (optional trusted role header)
//!     → middleware/admission.rs (admission decision)
//!         → denied: response.rs (403 / 429 / 500 JSON body)
//!         → allowed: downstream handler
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use server::HttpServer;
