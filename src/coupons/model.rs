use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Coupon row. Codes are stored uppercase; `max_uses` NULL means unlimited
/// and `expires_at` NULL means never expires.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: i32,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Redemption audit row; one per `(coupon, user)` ever.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct CouponUsage {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    #[validate(length(min = 3, max = 32, message = "Coupon code must be 3-32 characters"))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    #[validate(length(min = 3, max = 32, message = "Coupon code must be 3-32 characters"))]
    pub code: String,
    pub listing_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    /// Omit to get an auto-generated code.
    #[validate(length(min = 3, max = 32, message = "Coupon code must be 3-32 characters"))]
    pub code: Option<String>,
    #[validate(range(min = 1, max = 100, message = "Discount must be 1-100 percent"))]
    pub discount_percent: i32,
    #[validate(range(min = 1, message = "Max uses must be at least 1"))]
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: i32,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Coupon> for CouponResponse {
    fn from(coupon: Coupon) -> Self {
        Self {
            id: coupon.id,
            code: coupon.code,
            discount_percent: coupon.discount_percent,
            max_uses: coupon.max_uses,
            used_count: coupon.used_count,
            expires_at: coupon.expires_at,
            is_active: coupon.is_active,
            created_at: coupon.created_at,
        }
    }
}

/// Successful validation result; the redemption itself happens via apply.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidationResponse {
    pub code: String,
    pub discount_percent: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let valid = CreateCouponRequest {
            code: None,
            discount_percent: 100,
            max_uses: Some(50),
            expires_at: None,
        };
        assert!(valid.validate().is_ok());

        let zero_discount = CreateCouponRequest {
            code: None,
            discount_percent: 0,
            max_uses: None,
            expires_at: None,
        };
        assert!(zero_discount.validate().is_err());

        let over_discount = CreateCouponRequest {
            code: None,
            discount_percent: 101,
            max_uses: None,
            expires_at: None,
        };
        assert!(over_discount.validate().is_err());

        let short_code = CreateCouponRequest {
            code: Some("AB".to_string()),
            discount_percent: 10,
            max_uses: None,
            expires_at: None,
        };
        assert!(short_code.validate().is_err());
    }
}
