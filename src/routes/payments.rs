//! Payment routes: publication status, submission, admin review

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::payments;
use crate::state::AppState;

/// Create payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/listings/status", get(payments::publication_status))
        .route("/api/payments", post(payments::submit))
        .route("/api/admin/payments", get(payments::admin_list))
        .route("/api/admin/payments/:id/approve", put(payments::approve))
        .route("/api/admin/payments/:id/reject", put(payments::reject))
}
