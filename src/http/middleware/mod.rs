pub mod admission;
pub mod role;

pub use admission::admission_middleware;
pub use role::role_header_middleware;
