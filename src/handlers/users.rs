//! Account self-service handlers

use axum::{extract::State, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::{AccountResponse, UpdateAccountRequest};
use crate::state::AppState;

/// GET /api/users/me - Current account profile
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.auth_service.get_account(user.account_id).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// PUT /api/users/me - Partial self-update (name, password, roles)
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    req.validate()?;
    let account = state
        .auth_service
        .update_account(user.account_id, req)
        .await?;
    Ok(Json(AccountResponse::from(account)))
}
