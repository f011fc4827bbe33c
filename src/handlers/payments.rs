//! Payment HTTP handlers
//!
//! Publication-fee status, payment submission, and the admin review queue.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::{AdminUser, AuthenticatedUser};
use crate::admin::Capability;
use crate::error::ApiError;
use crate::models::PaginatedResponse;
use crate::payments::{
    AdminPaymentQuery, PaymentResponse, PublicationStatusResponse, SubmitPaymentRequest,
};
use crate::state::AppState;

/// GET /api/listings/status - Publication-gate status for new listings
pub async fn publication_status(
    State(state): State<AppState>,
) -> Result<Json<PublicationStatusResponse>, ApiError> {
    let status = state.payment_service.publication_status().await?;
    Ok(Json(status))
}

/// POST /api/payments - Submit a transaction claim for a pending listing
pub async fn submit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<SubmitPaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    req.validate()?;
    let payment = state.payment_service.submit(user.account_id, req).await?;
    Ok(Json(payment))
}

/// PUT /api/admin/payments/:id/approve - Approve a pending payment and
/// activate its listing
pub async fn approve(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    admin.require(Capability::Payments)?;
    let payment = state
        .payment_service
        .approve(payment_id, admin.admin.id)
        .await?;
    Ok(Json(payment))
}

/// PUT /api/admin/payments/:id/reject - Reject a pending payment; the listing
/// stays pending
pub async fn reject(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    admin.require(Capability::Payments)?;
    let payment = state
        .payment_service
        .reject(payment_id, admin.admin.id)
        .await?;
    Ok(Json(payment))
}

/// GET /api/admin/payments - Payment review queue, filterable by status
pub async fn admin_list(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(query): Query<AdminPaymentQuery>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, ApiError> {
    admin.require(Capability::Payments)?;
    let page = state.payment_service.admin_list(&query).await?;
    Ok(Json(page))
}
