//! API handlers for the Sayara backend

pub mod admin;
pub mod auth;
pub mod coupons;
pub mod favorites;
pub mod listings;
pub mod offers;
pub mod payments;
pub mod users;

// Re-export auth extractors from middleware for handler use
pub use crate::middleware::auth::{AdminUser, AuthenticatedUser, OptionalUser};
