//! Offer and inspection HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::offers::{
    CreateInspectionRequest, CreateOfferRequest, InspectionResponse, OfferResponse,
    UpdateInspectionStatusRequest, UpdateOfferStatusRequest,
};
use crate::state::AppState;

/// POST /api/offers - Make an offer on an active listing
pub async fn create_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateOfferRequest>,
) -> Result<Json<OfferResponse>, ApiError> {
    req.validate()?;
    let offer = state
        .offer_service
        .create_offer(user.account_id, &req)
        .await?;
    Ok(Json(offer))
}

/// PUT /api/offers/:id/status - Seller accepts or rejects an offer
pub async fn update_offer_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
    Json(req): Json<UpdateOfferStatusRequest>,
) -> Result<Json<OfferResponse>, ApiError> {
    let offer = state
        .offer_service
        .update_offer_status(offer_id, user.account_id, req.status)
        .await?;
    Ok(Json(offer))
}

/// GET /api/cars/:id/offers - Offers on an owned listing
pub async fn list_listing_offers(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<Vec<OfferResponse>>, ApiError> {
    let offers = state
        .offer_service
        .list_offers_for_listing(listing_id, user.account_id)
        .await?;
    Ok(Json(offers))
}

/// POST /api/inspections - Request an inspection on an active listing
pub async fn create_inspection(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateInspectionRequest>,
) -> Result<Json<InspectionResponse>, ApiError> {
    req.validate()?;
    let inspection = state
        .offer_service
        .create_inspection(user.account_id, &req)
        .await?;
    Ok(Json(inspection))
}

/// PUT /api/inspections/:id/status - Seller accepts or declines a request
pub async fn respond_inspection(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(inspection_id): Path<Uuid>,
    Json(req): Json<UpdateInspectionStatusRequest>,
) -> Result<Json<InspectionResponse>, ApiError> {
    let inspection = state
        .offer_service
        .respond_inspection(inspection_id, user.account_id, req.status)
        .await?;
    Ok(Json(inspection))
}

/// GET /api/inspections - Inspection requests where the caller is buyer or seller
pub async fn list_my_inspections(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<InspectionResponse>>, ApiError> {
    let inspections = state
        .offer_service
        .list_inspections_for(user.account_id)
        .await?;
    Ok(Json(inspections))
}
