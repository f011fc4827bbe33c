//! Coupon routes: user validate/apply plus admin management

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::coupons;
use crate::state::AppState;

/// Create coupon routes
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/api/coupons/validate", post(coupons::validate))
        .route("/api/coupons/apply", post(coupons::apply))
        .route(
            "/api/admin/coupons",
            get(coupons::list).post(coupons::create),
        )
}
