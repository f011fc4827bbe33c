//! Authentication extractors
//!
//! Three `FromRequestParts` extractors cover the access tiers: required
//! user auth, optional user auth, and admin auth. User and admin
//! extraction both re-read their identity row on every request, so
//! blocking an account or revoking a permission applies immediately
//! instead of when the token expires.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use uuid::Uuid;

use crate::admin::{Admin, AdminService, Capability, PermissionSet};
use crate::auth::{principal_id, verify_token, AuthService, Claims, JwtError};
use crate::error::ApiError;
use crate::models::AccountRole;

/// Authenticated marketplace user, loaded fresh from the accounts table.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
    pub phone: String,
    pub roles: Vec<AccountRole>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = verify_token(bearer.token(), auth_service.jwt_secret())
            .map_err(map_user_token_error)?;
        if claims.is_admin {
            return Err(ApiError::Unauthorized("User token required".to_string()));
        }
        let account_id = principal_id(&claims).map_err(map_user_token_error)?;

        let account = auth_service
            .find_account(account_id)
            .await?
            .ok_or(ApiError::UserDeleted)?;

        if !account.is_active {
            return Err(ApiError::AccountBlocked);
        }

        Ok(AuthenticatedUser {
            account_id: account.id,
            phone: account.phone,
            roles: account.roles,
        })
    }
}

fn map_user_token_error(err: JwtError) -> ApiError {
    match err {
        JwtError::TokenExpired => ApiError::TokenExpired,
        other => ApiError::InvalidToken(other.to_string()),
    }
}

/// Optional authentication for endpoints that serve both guests and users.
///
/// A missing header is always a guest. A present-but-bad token follows the
/// configured policy: lenient downgrades to guest, strict surfaces the
/// error.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(OptionalUser(None));
        }

        let auth_service = Arc::<AuthService>::from_ref(state);
        let strict = auth_service.optional_auth_strict();

        let downgrade = |err: ApiError| {
            if strict {
                Err(err)
            } else {
                tracing::debug!(error = %err, "Ignoring invalid token on optional-auth route");
                Ok(OptionalUser(None))
            }
        };

        let bearer = match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(_) => {
                return downgrade(ApiError::Unauthorized(
                    "Malformed Authorization header".to_string(),
                ))
            }
        };

        let claims = match verify_token(bearer.token(), auth_service.jwt_secret()) {
            Ok(claims) => claims,
            Err(err) => return downgrade(map_user_token_error(err)),
        };

        // A valid admin token is simply not a user; that is not an auth
        // failure in either policy.
        if claims.is_admin {
            return Ok(OptionalUser(None));
        }

        let account_id = match principal_id(&claims) {
            Ok(id) => id,
            Err(err) => return downgrade(map_user_token_error(err)),
        };

        match auth_service.find_account(account_id).await? {
            Some(account) if account.is_active => Ok(OptionalUser(Some(AuthenticatedUser {
                account_id: account.id,
                phone: account.phone,
                roles: account.roles,
            }))),
            Some(_) => downgrade(ApiError::AccountBlocked),
            None => downgrade(ApiError::UserDeleted),
        }
    }
}

/// Authenticated admin with a live permission snapshot.
///
/// Handlers call [`AdminUser::require`] for capability-gated operations;
/// super_admin and admin roles pass every check.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub admin: Admin,
    pub permissions: PermissionSet,
}

impl AdminUser {
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.permissions.allows(self.admin.role, capability) {
            Ok(())
        } else {
            Err(ApiError::InsufficientPermission(capability.as_str()))
        }
    }

    /// For staff-management and settings endpoints that are closed to
    /// employees regardless of capabilities.
    pub fn require_admin_role(&self) -> Result<(), ApiError> {
        if self.admin.role.bypasses_permissions() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin role required".to_string()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AdminService>: FromRef<S>,
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims: Claims = verify_token(bearer.token(), auth_service.jwt_secret())
            .map_err(map_admin_token_error)?;

        if !claims.is_admin {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        let admin_id = principal_id(&claims).map_err(map_admin_token_error)?;

        let admin_service = Arc::<AdminService>::from_ref(state);
        let admin = admin_service.authenticate(admin_id).await?;

        let permissions = PermissionSet::from_names(&admin.permissions);

        Ok(AdminUser { admin, permissions })
    }
}

fn map_admin_token_error(err: JwtError) -> ApiError {
    match err {
        JwtError::TokenExpired => ApiError::TokenExpired,
        _ => ApiError::InvalidToken("Invalid admin token".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminRole;
    use chrono::Utc;

    fn employee(permissions: Vec<String>) -> AdminUser {
        let admin = Admin {
            id: Uuid::new_v4(),
            email: "staff@sayara.app".to_string(),
            name: "Staff".to_string(),
            password_hash: String::new(),
            role: AdminRole::Employee,
            permissions: permissions.clone(),
            is_active: true,
            last_seen: None,
            created_at: Utc::now(),
        };
        let permissions = PermissionSet::from_names(&permissions);
        AdminUser { admin, permissions }
    }

    #[test]
    fn test_employee_capability_gate() {
        let user = employee(vec!["cars".to_string()]);
        assert!(user.require(Capability::Cars).is_ok());
        assert!(matches!(
            user.require(Capability::Payments),
            Err(ApiError::InsufficientPermission("payments"))
        ));
        assert!(user.require_admin_role().is_err());
    }

    #[test]
    fn test_super_admin_bypasses_everything() {
        let mut user = employee(vec![]);
        user.admin.role = AdminRole::SuperAdmin;
        assert!(user.require(Capability::Payments).is_ok());
        assert!(user.require_admin_role().is_ok());
    }

    #[test]
    fn test_expired_vs_invalid_mapping() {
        assert!(matches!(
            map_user_token_error(JwtError::TokenExpired),
            ApiError::TokenExpired
        ));
        assert!(matches!(
            map_user_token_error(JwtError::InvalidToken("bad".to_string())),
            ApiError::InvalidToken(_)
        ));
        assert!(matches!(
            map_admin_token_error(JwtError::DecodingFailed("bad".to_string())),
            ApiError::InvalidToken(_)
        ));
    }
}
