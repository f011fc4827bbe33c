//! JWT token generation and validation
//!
//! Handles creation and verification of user and admin bearer tokens.
//! User tokens carry the account's phone and roles; admin tokens carry the
//! admin's email and an `is_admin` marker so the two principals can never be
//! confused at the extractor level.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::admin::Admin;
use crate::models::{Account, AccountRole};

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims shared by user and admin tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account or admin ID)
    pub sub: String,
    /// Account phone number (user tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Admin email (admin tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Account roles (empty for admin tokens)
    #[serde(default)]
    pub roles: Vec<AccountRole>,
    /// Marks the token as an admin credential
    #[serde(default)]
    pub is_admin: bool,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Generate a bearer token for a marketplace account
///
/// # Arguments
/// * `account` - The authenticated account
/// * `secret` - JWT signing secret
/// * `ttl_days` - Token time-to-live in days
pub fn generate_user_token(
    account: &Account,
    secret: &str,
    ttl_days: i64,
) -> Result<String, JwtError> {
    let now = Utc::now();
    let exp = now + Duration::days(ttl_days);

    let claims = Claims {
        sub: account.id.to_string(),
        phone: Some(account.phone.clone()),
        email: None,
        roles: account.roles.clone(),
        is_admin: false,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    sign(&claims, secret)
}

/// Generate a bearer token for an admin identity
pub fn generate_admin_token(admin: &Admin, secret: &str, ttl_days: i64) -> Result<String, JwtError> {
    let now = Utc::now();
    let exp = now + Duration::days(ttl_days);

    let claims = Claims {
        sub: admin.id.to_string(),
        phone: None,
        email: Some(admin.email.clone()),
        roles: Vec::new(),
        is_admin: true,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    sign(&claims, secret)
}

fn sign(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify and decode a JWT token
///
/// # Returns
/// * `Ok(Claims)` if token is valid
/// * `Err(JwtError)` if validation fails
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Extract the principal ID from claims
pub fn principal_id(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminRole;
    use chrono::Utc;

    fn create_test_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            phone: "0501234567".to_string(),
            name: "Test User".to_string(),
            roles: vec![AccountRole::Buyer, AccountRole::Seller],
            is_active: true,
            password_hash: Some("$2b$12$hash".to_string()),
            google_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_test_admin() -> Admin {
        Admin {
            id: Uuid::new_v4(),
            email: "ops@example.com".to_string(),
            name: "Ops".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            role: AdminRole::Employee,
            permissions: vec!["cars".to_string()],
            is_active: true,
            last_seen: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_user_token() {
        let account = create_test_account();
        let secret = "test-secret-key";

        let token = generate_user_token(&account, secret, 30).unwrap();
        assert!(!token.is_empty());

        let claims = verify_token(&token, secret).unwrap();
        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.phone.as_deref(), Some("0501234567"));
        assert!(!claims.is_admin);
        assert_eq!(claims.roles.len(), 2);
    }

    #[test]
    fn test_generate_admin_token() {
        let admin = create_test_admin();
        let secret = "test-secret-key";

        let token = generate_admin_token(&admin, secret, 7).unwrap();
        let claims = verify_token(&token, secret).unwrap();
        assert!(claims.is_admin);
        assert_eq!(claims.email.as_deref(), Some("ops@example.com"));
        assert!(claims.roles.is_empty());
        assert_eq!(principal_id(&claims).unwrap(), admin.id);
    }

    #[test]
    fn test_invalid_token() {
        let secret = "test-secret-key";
        let result = verify_token("invalid.token.here", secret);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let account = create_test_account();

        let token = generate_user_token(&account, "secret1", 30).unwrap();
        let result = verify_token(&token, "secret2");
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_maps_to_token_expired() {
        let account = create_test_account();
        let secret = "test-secret-key";

        // ttl of -1 days puts exp in the past
        let token = generate_user_token(&account, secret, -1).unwrap();
        let result = verify_token(&token, secret);
        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }
}
