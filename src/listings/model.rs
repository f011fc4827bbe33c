use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// Listing row. New listings always start inactive; only payment approval,
/// coupon redemption or an admin override turns `is_active` on.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_sold: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Ownership gate shared by listing edits, payments, coupon redemption,
    /// offer responses and inspection responses.
    pub fn ensure_owned_by(&self, account_id: Uuid) -> Result<(), ApiError> {
        if self.owner_id == account_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You do not own this listing".to_string(),
            ))
        }
    }
}

/// Why a listing became publicly visible. One audit row is written per
/// activation, in the same transaction as the activation itself.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "activation_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivationReason {
    PaidApproved,
    CouponRedeemed,
    AdminOverride,
}

#[derive(Debug, sqlx::FromRow, Clone)]
pub struct Favorite {
    pub id: Uuid,
    pub account_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    #[validate(length(min = 3, max = 120, message = "Title must be 3-120 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,
    #[validate(length(min = 2, max = 60, message = "Category must be 2-60 characters"))]
    pub category: String,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,
    #[serde(default)]
    #[validate(length(max = 15, message = "At most 15 images per listing"))]
    pub images: Vec<String>,
}

/// Owner edit; every field optional, but any edit resets the listing to
/// pending review.
#[derive(Debug, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    #[validate(length(min = 3, max = 120, message = "Title must be 3-120 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 2, max = 60, message = "Category must be 2-60 characters"))]
    pub category: Option<String>,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: Option<i64>,
    #[validate(length(max = 15, message = "At most 15 images per listing"))]
    pub images: Option<Vec<String>>,
}

/// Admin visibility override.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatusRequest {
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub listing_id: Uuid,
}

#[derive(Debug, Deserialize, Default)]
pub struct BrowseQuery {
    pub category: Option<String>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

/// Admin review-queue filter; `status` is `active` or `pending`.
#[derive(Debug, Deserialize, Default)]
pub struct AdminListingQuery {
    pub status: Option<String>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_sold: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            owner_id: listing.owner_id,
            title: listing.title,
            description: listing.description,
            category: listing.category,
            price: listing.price,
            is_active: listing.is_active,
            is_featured: listing.is_featured,
            is_sold: listing.is_sold,
            images: listing.images,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing(owner_id: Uuid) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner_id,
            title: "2019 Toyota Corolla".to_string(),
            description: "Clean title".to_string(),
            category: "sedan".to_string(),
            price: 950_000,
            is_active: false,
            is_featured: false,
            is_sold: false,
            images: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ensure_owned_by() {
        let owner = Uuid::new_v4();
        let listing = sample_listing(owner);

        assert!(listing.ensure_owned_by(owner).is_ok());
        assert!(matches!(
            listing.ensure_owned_by(Uuid::new_v4()),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_create_request_validation() {
        let valid = CreateListingRequest {
            title: "2019 Toyota Corolla".to_string(),
            description: String::new(),
            category: "sedan".to_string(),
            price: 950_000,
            images: vec![],
        };
        assert!(valid.validate().is_ok());

        let short_title = CreateListingRequest {
            title: "ab".to_string(),
            description: String::new(),
            category: "sedan".to_string(),
            price: 950_000,
            images: vec![],
        };
        assert!(short_title.validate().is_err());

        let negative_price = CreateListingRequest {
            title: "2019 Toyota Corolla".to_string(),
            description: String::new(),
            category: "sedan".to_string(),
            price: -1,
            images: vec![],
        };
        assert!(negative_price.validate().is_err());
    }

    #[test]
    fn test_update_request_skips_absent_fields() {
        let empty = UpdateListingRequest::default();
        assert!(empty.validate().is_ok());

        let bad_category = UpdateListingRequest {
            category: Some("x".to_string()),
            ..Default::default()
        };
        assert!(bad_category.validate().is_err());
    }

    #[test]
    fn test_activation_reason_serde() {
        assert_eq!(
            serde_json::to_string(&ActivationReason::PaidApproved).unwrap(),
            "\"paid_approved\""
        );
        assert_eq!(
            serde_json::to_string(&ActivationReason::CouponRedeemed).unwrap(),
            "\"coupon_redeemed\""
        );
        assert_eq!(
            serde_json::to_string(&ActivationReason::AdminOverride).unwrap(),
            "\"admin_override\""
        );
    }

    #[test]
    fn test_listing_response_camel_case() {
        let listing = sample_listing(Uuid::new_v4());
        let json = serde_json::to_value(ListingResponse::from(listing)).unwrap();

        assert!(json.get("ownerId").is_some());
        assert!(json.get("isActive").is_some());
        assert!(json.get("isSold").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("owner_id").is_none());
    }
}
