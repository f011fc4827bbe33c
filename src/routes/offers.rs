//! Offer and inspection routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::offers;
use crate::state::AppState;

/// Create offer and inspection routes
pub fn offer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/offers", post(offers::create_offer))
        .route("/api/offers/:id/status", put(offers::update_offer_status))
        .route("/api/cars/:id/offers", get(offers::list_listing_offers))
        .route("/api/inspections", post(offers::create_inspection).get(offers::list_my_inspections))
        .route(
            "/api/inspections/:id/status",
            put(offers::respond_inspection),
        )
}
