use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "offer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "inspection_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, sqlx::FromRow, Clone)]
pub struct Offer {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub amount: i64,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `seller_id` is the listing owner captured at creation time; responses
/// are still gated on current listing ownership.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct InspectionRequest {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub note: Option<String>,
    pub status: InspectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub listing_id: Uuid,
    #[validate(range(min = 1, message = "Offer amount must be positive"))]
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferStatusRequest {
    pub status: OfferStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInspectionRequest {
    pub listing_id: Uuid,
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInspectionStatusRequest {
    pub status: InspectionStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub amount: i64,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Offer> for OfferResponse {
    fn from(offer: Offer) -> Self {
        Self {
            id: offer.id,
            listing_id: offer.listing_id,
            buyer_id: offer.buyer_id,
            amount: offer.amount,
            status: offer.status,
            created_at: offer.created_at,
            updated_at: offer.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub note: Option<String>,
    pub status: InspectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InspectionRequest> for InspectionResponse {
    fn from(request: InspectionRequest) -> Self {
        Self {
            id: request.id,
            listing_id: request.listing_id,
            buyer_id: request.buyer_id,
            seller_id: request.seller_id,
            note: request.note,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_status_serde() {
        assert_eq!(
            serde_json::to_string(&OfferStatus::Accepted).unwrap(),
            "\"accepted\""
        );
        let status: InspectionStatus = serde_json::from_str("\"declined\"").unwrap();
        assert_eq!(status, InspectionStatus::Declined);
    }

    #[test]
    fn test_create_offer_validation() {
        let valid = CreateOfferRequest {
            listing_id: Uuid::new_v4(),
            amount: 900_000,
        };
        assert!(valid.validate().is_ok());

        let zero = CreateOfferRequest {
            listing_id: Uuid::new_v4(),
            amount: 0,
        };
        assert!(zero.validate().is_err());
    }
}
