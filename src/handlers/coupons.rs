//! Coupon HTTP handlers
//!
//! User-facing validate/apply plus admin coupon management.

use axum::{extract::State, Json};
use validator::Validate;

use super::{AdminUser, AuthenticatedUser};
use crate::admin::Capability;
use crate::coupons::{
    ApplyCouponRequest, CouponResponse, CouponValidationResponse, CreateCouponRequest,
    ValidateCouponRequest,
};
use crate::error::ApiError;
use crate::listings::ListingResponse;
use crate::state::AppState;

/// POST /api/coupons/validate - Read-only eligibility check for a coupon code
pub async fn validate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<CouponValidationResponse>, ApiError> {
    req.validate()?;
    let result = state
        .coupon_service
        .validate(user.account_id, &req.code)
        .await?;
    Ok(Json(result))
}

/// POST /api/coupons/apply - Redeem a coupon against an owned listing,
/// activating it without admin review
pub async fn apply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<ApplyCouponRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    req.validate()?;
    let listing = state.coupon_service.apply(user.account_id, &req).await?;
    Ok(Json(listing))
}

/// POST /api/admin/coupons - Create a coupon; code is generated when omitted
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<CreateCouponRequest>,
) -> Result<Json<CouponResponse>, ApiError> {
    admin.require(Capability::Payments)?;
    req.validate()?;
    let coupon = state.coupon_service.create(req).await?;
    Ok(Json(coupon))
}

/// GET /api/admin/coupons - List all coupons
pub async fn list(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<Vec<CouponResponse>>, ApiError> {
    admin.require(Capability::Payments)?;
    let coupons = state.coupon_service.list().await?;
    Ok(Json(coupons))
}
