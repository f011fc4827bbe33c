//! Route definitions for the Sayara API

mod admin;
mod auth;
mod coupons;
mod favorites;
mod listings;
mod offers;
mod payments;
mod users;

pub use admin::admin_routes;
pub use auth::auth_routes;
pub use coupons::coupon_routes;
pub use favorites::favorite_routes;
pub use listings::listing_routes;
pub use offers::offer_routes;
pub use payments::payment_routes;
pub use users::user_routes;
