//! HTTP middleware
//!
//! Authentication extractors, request tracing, global rate limiting and
//! security headers.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use auth::{AdminUser, AuthenticatedUser, OptionalUser};
pub use rate_limiter::{rate_limit_layer, RateLimiter};
pub use security::{hsts_header, security_headers};
pub use tracing::request_tracing;
