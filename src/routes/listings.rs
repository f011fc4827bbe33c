//! Listing routes: public browse, owner CRUD, and the admin review queue

use axum::{
    routing::{get, patch, put},
    Router,
};

use crate::handlers::listings;
use crate::state::AppState;

/// Create listing routes
pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cars", get(listings::browse).post(listings::create_listing))
        .route("/api/cars/mine", get(listings::list_mine))
        .route(
            "/api/cars/:id",
            get(listings::get_listing)
                .put(listings::update_listing)
                .delete(listings::delete_listing),
        )
        .route("/api/cars/:id/sold", patch(listings::toggle_sold))
        .route("/api/admin/cars", get(listings::admin_list))
        .route("/api/admin/cars/:id/status", put(listings::admin_set_status))
}
