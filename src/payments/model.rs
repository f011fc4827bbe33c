use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

/// Payment claim row. `trx_no` is the bank transfer reference typed in by
/// the user; it is globally unique and never reused, so a rejected claim is
/// retried with a fresh number.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub submitted_by: Uuid,
    pub trx_no: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPaymentRequest {
    pub listing_id: Uuid,
    #[validate(length(min = 3, max = 64, message = "Transaction number must be 3-64 characters"))]
    pub trx_no: String,
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub submitted_by: Uuid,
    pub trx_no: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            listing_id: payment.listing_id,
            submitted_by: payment.submitted_by,
            trx_no: payment.trx_no,
            amount: payment.amount,
            status: payment.status,
            approved_by: payment.approved_by,
            approved_at: payment.approved_at,
            created_at: payment.created_at,
        }
    }
}

/// What the client needs to know before publishing: whether a payment or
/// coupon step is required and what the fee is.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationStatusResponse {
    pub total_listings: i64,
    pub free_limit: i64,
    pub requires_payment: bool,
    pub listing_fee: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct AdminPaymentQuery {
    pub status: Option<PaymentStatus>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: PaymentStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(status, PaymentStatus::Approved);
    }

    #[test]
    fn test_submit_request_validation() {
        let valid = SubmitPaymentRequest {
            listing_id: Uuid::new_v4(),
            trx_no: "TRX-2024-0001".to_string(),
            amount: 500,
        };
        assert!(valid.validate().is_ok());

        let short_trx = SubmitPaymentRequest {
            listing_id: Uuid::new_v4(),
            trx_no: "ab".to_string(),
            amount: 500,
        };
        assert!(short_trx.validate().is_err());

        let zero_amount = SubmitPaymentRequest {
            listing_id: Uuid::new_v4(),
            trx_no: "TRX-2024-0001".to_string(),
            amount: 0,
        };
        assert!(zero_amount.validate().is_err());
    }

    #[test]
    fn test_publication_status_camel_case() {
        let status = PublicationStatusResponse {
            total_listings: 42,
            free_limit: 100,
            requires_payment: false,
            listing_fee: 500,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["totalListings"], 42);
        assert_eq!(json["freeLimit"], 100);
        assert_eq!(json["requiresPayment"], false);
        assert_eq!(json["listingFee"], 500);
    }
}
