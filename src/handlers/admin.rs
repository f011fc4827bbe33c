//! Admin HTTP handlers
//!
//! Throttled login, staff management, account moderation, and the
//! publication-gate settings.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::AdminUser;
use crate::admin::{
    AdminLoginRequest, AdminLoginResponse, AdminResponse, Capability, CreateAdminRequest,
    SetAccountActiveRequest, ALL_CAPABILITIES,
};
use crate::auth::throttle_identifier;
use crate::error::ApiError;
use crate::models::{AccountResponse, PaginatedResponse, PaginationParams};
use crate::settings::PublicationSettings;
use crate::state::AppState;

/// POST /api/admin/login - Email/password login, throttled per device or IP
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    req.validate()?;
    let identifier = throttle_identifier(&headers, Some(addr));
    let response = state
        .admin_service
        .login(&req.email, &req.password, &identifier)
        .await?;
    Ok(Json(response))
}

/// GET /api/admin/me - Admin identity with the effective permission set
pub async fn me(admin: AdminUser) -> Result<Json<AdminResponse>, ApiError> {
    let effective: Vec<String> = if admin.admin.role.bypasses_permissions() {
        ALL_CAPABILITIES
            .iter()
            .map(|cap| cap.as_str().to_string())
            .collect()
    } else {
        admin
            .permissions
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    };
    let mut response = AdminResponse::from(admin.admin);
    response.permissions = effective;
    Ok(Json(response))
}

/// POST /api/admin/admins - Create a staff member with validated capabilities
pub async fn create_admin(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<CreateAdminRequest>,
) -> Result<Json<AdminResponse>, ApiError> {
    admin.require_admin_role()?;
    req.validate()?;
    let created = state.admin_service.create_admin(req).await?;
    Ok(Json(created))
}

/// GET /api/admin/admins - List all staff members
pub async fn list_admins(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<Vec<AdminResponse>>, ApiError> {
    admin.require_admin_role()?;
    let admins = state.admin_service.list_admins().await?;
    Ok(Json(admins))
}

/// GET /api/admin/users - List registered accounts
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<AccountResponse>>, ApiError> {
    admin.require(Capability::Users)?;
    let page = state.admin_service.list_accounts(&pagination).await?;
    Ok(Json(page))
}

/// PATCH /api/admin/users/:id/active - Block or unblock an account
pub async fn set_user_active(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(account_id): Path<Uuid>,
    Json(req): Json<SetAccountActiveRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    admin.require(Capability::Users)?;
    let account = state
        .admin_service
        .set_account_active(account_id, req.is_active)
        .await?;
    Ok(Json(account))
}

/// DELETE /api/admin/users/:id - Hard delete an account and everything it owns
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    admin.require(Capability::Users)?;
    state.admin_service.delete_account(account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/providers - Accounts holding a service-provider role
pub async fn list_providers(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<AccountResponse>>, ApiError> {
    admin.require(Capability::Providers)?;
    let page = state.admin_service.list_providers(&pagination).await?;
    Ok(Json(page))
}

/// GET /api/admin/settings - Current publication-gate settings
pub async fn get_settings(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<PublicationSettings>, ApiError> {
    admin.require_admin_role()?;
    let settings = state.settings_service.publication().await?;
    Ok(Json(settings))
}

/// PUT /api/admin/settings - Replace the publication-gate settings
pub async fn update_settings(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<PublicationSettings>,
) -> Result<Json<PublicationSettings>, ApiError> {
    admin.require_admin_role()?;
    let settings = state.settings_service.update_publication(req).await?;
    Ok(Json(settings))
}
