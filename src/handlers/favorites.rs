//! Favorites HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::listings::{FavoriteRequest, ListingResponse};
use crate::state::AppState;

/// POST /api/favorites - Save a listing; duplicates are a 409
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<FavoriteRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .listing_service
        .add_favorite(user.account_id, req.listing_id)
        .await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/favorites/:listing_id - Remove a saved listing
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .listing_service
        .remove_favorite(user.account_id, listing_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/favorites - The caller's saved listings, newest first
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ListingResponse>>, ApiError> {
    let listings = state.listing_service.list_favorites(user.account_id).await?;
    Ok(Json(listings))
}
