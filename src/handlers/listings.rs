//! Listing HTTP handlers
//!
//! Public browse/detail, owner CRUD, and the admin review queue.

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::{AdminUser, AuthenticatedUser, OptionalUser};
use crate::admin::Capability;
use crate::auth::{principal_id, verify_token};
use crate::error::ApiError;
use crate::listings::{
    AdminListingQuery, AdminStatusRequest, BrowseQuery, CreateListingRequest, ListingResponse,
    ListingViewer, UpdateListingRequest,
};
use crate::models::{PaginatedResponse, PaginationParams};
use crate::state::AppState;

/// GET /api/cars - Public browse over active listings
pub async fn browse(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<PaginatedResponse<ListingResponse>>, ApiError> {
    let page = state.listing_service.browse_public(&query).await?;
    Ok(Json(page))
}

/// GET /api/cars/:id - Listing detail; pending listings are visible to the
/// owner and to admins only
pub async fn get_listing(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<ListingResponse>, ApiError> {
    let viewer = resolve_viewer(&state, user, &headers).await;
    let listing = state.listing_service.get_detail(listing_id, viewer).await?;
    Ok(Json(listing))
}

/// GET /api/cars/mine - Caller's own listings in any state
pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<ListingResponse>>, ApiError> {
    let page = state
        .listing_service
        .list_mine(user.account_id, &pagination)
        .await?;
    Ok(Json(page))
}

/// POST /api/cars - Create a listing; always starts pending review
pub async fn create_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateListingRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    req.validate()?;
    let listing = state.listing_service.create(user.account_id, req).await?;
    Ok(Json(listing))
}

/// PUT /api/cars/:id - Owner edit; any change sends the listing back to pending
pub async fn update_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<UpdateListingRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    req.validate()?;
    let listing = state
        .listing_service
        .update_by_owner(listing_id, user.account_id, req)
        .await?;
    Ok(Json(listing))
}

/// PATCH /api/cars/:id/sold - Toggle the sold flag; active state is untouched
pub async fn toggle_sold(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<ListingResponse>, ApiError> {
    let listing = state
        .listing_service
        .toggle_sold(listing_id, user.account_id)
        .await?;
    Ok(Json(listing))
}

/// DELETE /api/cars/:id - Owner delete, cascading favorites/offers/payments
pub async fn delete_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .listing_service
        .delete_by_owner(listing_id, user.account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/cars - Review queue, filterable by active/pending
pub async fn admin_list(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(query): Query<AdminListingQuery>,
) -> Result<Json<PaginatedResponse<ListingResponse>>, ApiError> {
    admin.require(Capability::Cars)?;
    let page = state.listing_service.admin_list(&query).await?;
    Ok(Json(page))
}

/// PUT /api/admin/cars/:id/status - Direct isActive/isFeatured override
pub async fn admin_set_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<AdminStatusRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    admin.require(Capability::Cars)?;
    let listing = state
        .listing_service
        .admin_set_status(listing_id, admin.admin.id, &req)
        .await?;
    Ok(Json(listing))
}

/// Resolve who is looking at a listing. Admin tokens are re-checked against
/// the admins table so a deactivated admin cannot keep seeing pending
/// listings.
async fn resolve_viewer(
    state: &AppState,
    user: Option<AuthenticatedUser>,
    headers: &HeaderMap,
) -> ListingViewer {
    if let Some(user) = user {
        return ListingViewer::Account(user.account_id);
    }
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let Some(token) = token else {
        return ListingViewer::Guest;
    };
    let Ok(claims) = verify_token(token, state.auth_service.jwt_secret()) else {
        return ListingViewer::Guest;
    };
    if !claims.is_admin {
        return ListingViewer::Guest;
    }
    let Ok(admin_id) = principal_id(&claims) else {
        return ListingViewer::Guest;
    };
    match state.admin_service.authenticate(admin_id).await {
        Ok(_) => ListingViewer::Admin,
        Err(_) => ListingViewer::Guest,
    }
}
