//! Admin routes: login, staff, account moderation, settings

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::handlers::admin;
use crate::state::AppState;

/// Create admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/me", get(admin::me))
        .route(
            "/api/admin/admins",
            get(admin::list_admins).post(admin::create_admin),
        )
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/active", patch(admin::set_user_active))
        .route("/api/admin/users/:id", delete(admin::delete_user))
        .route("/api/admin/providers", get(admin::list_providers))
        .route(
            "/api/admin/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
}
