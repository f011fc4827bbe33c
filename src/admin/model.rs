use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::admin::permissions::AdminRole;

/// Admin row as stored. Never serialized directly; responses go through
/// [`AdminResponse`].
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: admin.role,
            permissions: admin.permissions,
            is_active: admin.is_active,
            last_seen: admin.last_seen,
            created_at: admin.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub token: String,
    pub admin: AdminResponse,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 2, max = 80, message = "Name must be 2-80 characters"))]
    pub name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: AdminRole,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Body for toggling an account's active flag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAccountActiveRequest {
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_admin_request_validation() {
        let valid = CreateAdminRequest {
            email: "ops@sayara.app".to_string(),
            name: "Ops Admin".to_string(),
            password: "password123".to_string(),
            role: AdminRole::Employee,
            permissions: vec!["cars".to_string()],
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateAdminRequest {
            email: "not-an-email".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_email.validate().is_err());

        let short_password = CreateAdminRequest {
            password: "short".to_string(),
            ..valid_clone(&valid)
        };
        assert!(short_password.validate().is_err());
    }

    fn valid_clone(req: &CreateAdminRequest) -> CreateAdminRequest {
        CreateAdminRequest {
            email: req.email.clone(),
            name: req.name.clone(),
            password: req.password.clone(),
            role: req.role,
            permissions: req.permissions.clone(),
        }
    }

    #[test]
    fn test_admin_response_hides_password_hash() {
        let admin = Admin {
            id: Uuid::new_v4(),
            email: "ops@sayara.app".to_string(),
            name: "Ops".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            role: AdminRole::SuperAdmin,
            permissions: vec![],
            is_active: true,
            last_seen: None,
            created_at: Utc::now(),
        };

        let response = AdminResponse::from(admin);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"role\":\"super_admin\""));
        assert!(json.contains("isActive"));
    }
}
