//! Favorites routes

use axum::{
    routing::{delete, get},
    Router,
};

use crate::handlers::favorites;
use crate::state::AppState;

/// Create favorites routes
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/favorites",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route(
            "/api/favorites/:listing_id",
            delete(favorites::remove_favorite),
        )
}
