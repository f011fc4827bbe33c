//! Auth-facing request/response DTOs
//!
//! All wire DTOs use camelCase field names for compatibility with the
//! pre-existing mobile client.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::AccountRole;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 6, max = 20, message = "phone must be 6-20 characters"))]
    pub phone: String,

    #[validate(length(min = 2, max = 80, message = "name must be 2-80 characters"))]
    pub name: String,

    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,

    /// Roles requested at sign-up; defaults to buyer when absent.
    pub roles: Option<Vec<AccountRole>>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Google sign-in request carrying the client-obtained ID token
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInRequest {
    #[validate(length(min = 1, message = "idToken is required"))]
    pub id_token: String,
}

/// Partial self-update for the authenticated account
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(min = 2, max = 80, message = "name must be 2-80 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: Option<String>,

    pub roles: Option<Vec<AccountRole>>,
}

/// Account response (sanitized for API)
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub phone: String,
    pub name: String,
    pub roles: Vec<AccountRole>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Auth tokens response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensResponse {
    pub token: String,
    pub user: AccountResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            phone: "0501234567".to_string(),
            name: "Test User".to_string(),
            password: "long-enough-pw".to_string(),
            roles: None,
        };
        assert!(req.validate().is_ok());

        let req = RegisterRequest {
            phone: "123".to_string(),
            name: "Test User".to_string(),
            password: "long-enough-pw".to_string(),
            roles: None,
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            phone: "0501234567".to_string(),
            name: "Test User".to_string(),
            password: "short".to_string(),
            roles: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_dto_fields_are_camel_case() {
        let json = r#"{"idToken": "abc"}"#;
        let req: GoogleSignInRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.id_token, "abc");
    }
}
