//! Centralized API error handling for Sayara
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    // --- Authentication ---
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Account no longer exists")]
    UserDeleted,

    #[error("Account is blocked")]
    AccountBlocked,

    // --- Authorization ---
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Missing required permission: {0}")]
    InsufficientPermission(&'static str),

    // --- Throttling ---
    #[error("Too many login attempts. Try again in {minutes} minute(s)")]
    TemporarilyBlocked { minutes: i64 },

    // --- Validation ---
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Amount is below the minimum listing fee of {minimum}")]
    BelowMinimumFee { minimum: i64 },

    #[error("Invalid or inactive coupon code")]
    InvalidCoupon,

    #[error("Coupon code has expired")]
    ExpiredCoupon,

    #[error("Coupon code has no uses left")]
    ExhaustedCoupon,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    // --- Conflicts ---
    #[error("Transaction number already submitted")]
    DuplicateTransaction,

    #[error("Coupon already used by this account")]
    DuplicateCouponUsage,

    #[error("Listing already in favorites")]
    DuplicateFavorite,

    #[error("Conflict: {0}")]
    Conflict(String),

    // --- Not found ---
    #[error("{0} not found")]
    NotFound(String),

    // --- Server side ---
    #[error("Database error: {0}")]
    Database(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::UserDeleted => "USER_DELETED",
            ApiError::AccountBlocked => "ACCOUNT_BLOCKED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::InsufficientPermission(_) => "INSUFFICIENT_PERMISSION",
            ApiError::TemporarilyBlocked { .. } => "TEMPORARILY_BLOCKED",
            ApiError::MissingField(_) => "MISSING_FIELD",
            ApiError::BelowMinimumFee { .. } => "BELOW_MINIMUM_FEE",
            ApiError::InvalidCoupon => "INVALID_COUPON",
            ApiError::ExpiredCoupon => "EXPIRED_COUPON",
            ApiError::ExhaustedCoupon => "EXHAUSTED_COUPON",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            ApiError::DuplicateCouponUsage => "DUPLICATE_COUPON_USAGE",
            ApiError::DuplicateFavorite => "DUPLICATE_FAVORITE",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_)
            | ApiError::InvalidToken(_)
            | ApiError::TokenExpired
            | ApiError::UserDeleted => StatusCode::UNAUTHORIZED,
            ApiError::AccountBlocked
            | ApiError::Forbidden(_)
            | ApiError::InsufficientPermission(_) => StatusCode::FORBIDDEN,
            ApiError::TemporarilyBlocked { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::MissingField(_)
            | ApiError::BelowMinimumFee { .. }
            | ApiError::InvalidCoupon
            | ApiError::ExpiredCoupon
            | ApiError::ExhaustedCoupon
            | ApiError::Validation(_)
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateTransaction
            | ApiError::DuplicateCouponUsage
            | ApiError::DuplicateFavorite
            | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Server-side failures are reported generically
    /// so internals never leak into a response body.
    fn public_message(&self) -> String {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Log server errors with full detail
        match &self {
            ApiError::Database(_) | ApiError::Internal(_) | ApiError::ExternalService(_) => {
                tracing::error!(error = %self, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %self, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// Convenience conversions from common error types

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource".to_string()),
            _ => ApiError::Database(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::ExternalService(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("Password hashing failed: {}", err))
    }
}

/// True when a sqlx error is a unique-constraint violation on the given
/// constraint name. Used to map races caught by the database into typed 409s.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("23505")
                && db.constraint().map_or(true, |c| c == constraint)
        }
        _ => false,
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::Unauthorized("test".to_string()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(ApiError::TokenExpired.error_code(), "TOKEN_EXPIRED");
        assert_eq!(ApiError::AccountBlocked.error_code(), "ACCOUNT_BLOCKED");
        assert_eq!(
            ApiError::TemporarilyBlocked { minutes: 3 }.error_code(),
            "TEMPORARILY_BLOCKED"
        );
        assert_eq!(
            ApiError::DuplicateTransaction.error_code(),
            "DUPLICATE_TRANSACTION"
        );
        assert_eq!(ApiError::ExpiredCoupon.error_code(), "EXPIRED_COUPON");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Unauthorized("test".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::UserDeleted.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AccountBlocked.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::InsufficientPermission("payments").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::TemporarilyBlocked { minutes: 5 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::DuplicateCouponUsage.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::BelowMinimumFee { minimum: 500 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("Listing".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_throttle_message_carries_minutes() {
        let err = ApiError::TemporarilyBlocked { minutes: 4 };
        assert!(err.to_string().contains('4'));
    }

    #[test]
    fn test_server_errors_do_not_leak_detail() {
        let err = ApiError::Database("connection refused on 10.0.0.3".to_string());
        assert_eq!(err.public_message(), "Internal server error");

        let err = ApiError::BadRequest("price missing".to_string());
        assert!(err.public_message().contains("price missing"));
    }
}
