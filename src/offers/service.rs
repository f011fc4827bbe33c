use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::listings::model::Listing;
use crate::listings::service::LISTING_COLUMNS;
use crate::offers::model::{
    CreateInspectionRequest, CreateOfferRequest, InspectionRequest, InspectionResponse,
    InspectionStatus, Offer, OfferResponse, OfferStatus,
};

const OFFER_COLUMNS: &str = "id, listing_id, buyer_id, amount, status, created_at, updated_at";

const INSPECTION_COLUMNS: &str =
    "id, listing_id, buyer_id, seller_id, note, status, created_at, updated_at";

/// Buyer offers and inspection requests. Creation is buyer-side; responses
/// are gated on current listing ownership.
pub struct OfferService {
    db_pool: PgPool,
}

impl OfferService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create_offer(
        &self,
        buyer_id: Uuid,
        request: &CreateOfferRequest,
    ) -> ApiResult<OfferResponse> {
        let listing = self.load_visible_listing(request.listing_id).await?;

        if listing.owner_id == buyer_id {
            return Err(ApiError::BadRequest(
                "Cannot offer on own listing".to_string(),
            ));
        }

        let offer = sqlx::query_as::<_, Offer>(&format!(
            "INSERT INTO offers (id, listing_id, buyer_id, amount)
             VALUES ($1, $2, $3, $4)
             RETURNING {OFFER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(listing.id)
        .bind(buyer_id)
        .bind(request.amount)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(offer_id = %offer.id, listing_id = %listing.id, "Offer created");
        Ok(offer.into())
    }

    /// Accept or reject an offer; listing owner only, no way back to
    /// pending.
    pub async fn update_offer_status(
        &self,
        offer_id: Uuid,
        caller_id: Uuid,
        status: OfferStatus,
    ) -> ApiResult<OfferResponse> {
        if status == OfferStatus::Pending {
            return Err(ApiError::BadRequest(
                "Status must be accepted or rejected".to_string(),
            ));
        }

        let offer = self.load_offer(offer_id).await?;
        let listing = self.load_listing(offer.listing_id).await?;
        listing.ensure_owned_by(caller_id)?;

        let offer = sqlx::query_as::<_, Offer>(&format!(
            "UPDATE offers SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {OFFER_COLUMNS}"
        ))
        .bind(offer_id)
        .bind(status)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(offer_id = %offer_id, status = ?status, "Offer status updated");
        Ok(offer.into())
    }

    /// Offers on a listing, for its owner.
    pub async fn list_offers_for_listing(
        &self,
        listing_id: Uuid,
        caller_id: Uuid,
    ) -> ApiResult<Vec<OfferResponse>> {
        let listing = self.load_listing(listing_id).await?;
        listing.ensure_owned_by(caller_id)?;

        let offers = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE listing_id = $1 ORDER BY created_at DESC"
        ))
        .bind(listing_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(offers.into_iter().map(OfferResponse::from).collect())
    }

    pub async fn create_inspection(
        &self,
        buyer_id: Uuid,
        request: &CreateInspectionRequest,
    ) -> ApiResult<InspectionResponse> {
        let listing = self.load_visible_listing(request.listing_id).await?;

        if listing.owner_id == buyer_id {
            return Err(ApiError::BadRequest(
                "Cannot request inspection on own listing".to_string(),
            ));
        }

        let inspection = sqlx::query_as::<_, InspectionRequest>(&format!(
            "INSERT INTO inspection_requests (id, listing_id, buyer_id, seller_id, note)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {INSPECTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(listing.id)
        .bind(buyer_id)
        .bind(listing.owner_id)
        .bind(request.note.as_deref().map(str::trim))
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            inspection_id = %inspection.id,
            listing_id = %listing.id,
            "Inspection requested"
        );
        Ok(inspection.into())
    }

    /// Accept or decline an inspection request; the listing's current owner
    /// only.
    pub async fn respond_inspection(
        &self,
        inspection_id: Uuid,
        caller_id: Uuid,
        status: InspectionStatus,
    ) -> ApiResult<InspectionResponse> {
        if status == InspectionStatus::Pending {
            return Err(ApiError::BadRequest(
                "Status must be accepted or declined".to_string(),
            ));
        }

        let inspection = self.load_inspection(inspection_id).await?;
        let listing = self.load_listing(inspection.listing_id).await?;
        listing.ensure_owned_by(caller_id)?;

        let inspection = sqlx::query_as::<_, InspectionRequest>(&format!(
            "UPDATE inspection_requests SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {INSPECTION_COLUMNS}"
        ))
        .bind(inspection_id)
        .bind(status)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(inspection_id = %inspection_id, status = ?status, "Inspection responded");
        Ok(inspection.into())
    }

    /// Inspection requests the account is involved in, either side.
    pub async fn list_inspections_for(&self, account_id: Uuid) -> ApiResult<Vec<InspectionResponse>> {
        let inspections = sqlx::query_as::<_, InspectionRequest>(&format!(
            "SELECT {INSPECTION_COLUMNS} FROM inspection_requests
             WHERE buyer_id = $1 OR seller_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(inspections
            .into_iter()
            .map(InspectionResponse::from)
            .collect())
    }

    async fn load_offer(&self, offer_id: Uuid) -> ApiResult<Offer> {
        sqlx::query_as::<_, Offer>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1"
        ))
        .bind(offer_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Offer".to_string()))
    }

    async fn load_inspection(&self, inspection_id: Uuid) -> ApiResult<InspectionRequest> {
        sqlx::query_as::<_, InspectionRequest>(&format!(
            "SELECT {INSPECTION_COLUMNS} FROM inspection_requests WHERE id = $1"
        ))
        .bind(inspection_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Inspection request".to_string()))
    }

    async fn load_listing(&self, listing_id: Uuid) -> ApiResult<Listing> {
        sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(listing_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing".to_string()))
    }

    /// Buyers act only on listings they can see; a pending listing 404s
    /// here just like on the detail endpoint.
    async fn load_visible_listing(&self, listing_id: Uuid) -> ApiResult<Listing> {
        let listing = self.load_listing(listing_id).await?;
        if !listing.is_active {
            return Err(ApiError::NotFound("Listing".to_string()));
        }
        Ok(listing)
    }
}
