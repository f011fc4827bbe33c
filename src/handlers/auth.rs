//! Authentication HTTP handlers
//!
//! Phone/password registration and login plus Google sign-in.

use axum::{extract::State, Json};
use validator::Validate;

use crate::error::ApiError;
use crate::models::{AuthTokensResponse, GoogleSignInRequest, LoginRequest, RegisterRequest};
use crate::state::AppState;

/// POST /api/auth/register - Create an account and issue a session token
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    req.validate()?;
    let tokens = state.auth_service.register(req).await?;
    Ok(Json(tokens))
}

/// POST /api/auth/login - Authenticate with phone and password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    req.validate()?;
    let tokens = state.auth_service.login(&req.phone, &req.password).await?;
    Ok(Json(tokens))
}

/// POST /api/auth/google - Sign in with a Google ID token, registering on first use
pub async fn google_sign_in(
    State(state): State<AppState>,
    Json(req): Json<GoogleSignInRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    req.validate()?;
    let tokens = state.auth_service.google_sign_in(&req.id_token).await?;
    Ok(Json(tokens))
}
