//! Account self-service routes

use axum::{routing::get, Router};

use crate::handlers::users;
use crate::state::AppState;

/// Create user profile routes
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/api/users/me", get(users::get_me).put(users::update_me))
}
