use std::sync::Arc;

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::listings::model::{ActivationReason, Listing};
use crate::listings::service::{activate_listing, LISTING_COLUMNS};
use crate::models::{PaginatedResponse, PaginationParams};
use crate::payments::model::{
    AdminPaymentQuery, Payment, PaymentResponse, PaymentStatus, PublicationStatusResponse,
    SubmitPaymentRequest,
};
use crate::settings::SettingsService;

const PAYMENT_COLUMNS: &str = "id, listing_id, submitted_by, trx_no, amount, status, \
     approved_by, approved_at, created_at";

/// Cash-payment publication path: users wire the fee at a bank and submit
/// the transfer reference; an admin approves or rejects the claim.
pub struct PaymentService {
    db_pool: PgPool,
    settings: Arc<SettingsService>,
}

impl PaymentService {
    pub fn new(db_pool: PgPool, settings: Arc<SettingsService>) -> Self {
        Self { db_pool, settings }
    }

    /// Whether the publication gate is open and what the fee would be.
    ///
    /// The gate keys off the total account count while the response reports
    /// the listing count; both behaviors predate this server and the mobile
    /// client depends on the response shape, so the mismatch stays.
    pub async fn publication_status(&self) -> ApiResult<PublicationStatusResponse> {
        let settings = self.settings.publication().await?;

        let account_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.db_pool)
            .await?;
        let listing_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PublicationStatusResponse {
            total_listings: listing_count,
            free_limit: settings.free_listing_limit,
            requires_payment: account_count >= settings.free_listing_limit,
            listing_fee: settings.listing_fees.default,
        })
    }

    /// Submit a payment claim for a listing the caller owns.
    ///
    /// The fee floor is checked before any row is written. With auto-approve
    /// on, the claim is stored approved and the listing activates in the
    /// same transaction; otherwise it waits in the admin queue.
    pub async fn submit(
        &self,
        user_id: Uuid,
        request: SubmitPaymentRequest,
    ) -> ApiResult<PaymentResponse> {
        let listing = self.load_listing(request.listing_id).await?;
        listing.ensure_owned_by(user_id)?;

        let settings = self.settings.publication().await?;
        let minimum = settings.listing_fees.fee_for(&listing.category);
        if request.amount < minimum {
            return Err(ApiError::BelowMinimumFee { minimum });
        }

        let trx_no = request.trx_no.trim().to_string();

        // Pre-check for a friendly error; the unique constraint is the
        // real guarantee under concurrency.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM payments WHERE trx_no = $1)")
            .bind(&trx_no)
            .fetch_one(&self.db_pool)
            .await?;
        if exists {
            return Err(ApiError::DuplicateTransaction);
        }

        let payment = if settings.auto_approve_payments {
            let mut tx = self.db_pool.begin().await?;

            let payment = sqlx::query_as::<_, Payment>(&format!(
                "INSERT INTO payments (id, listing_id, submitted_by, trx_no, amount, status, approved_at)
                 VALUES ($1, $2, $3, $4, $5, 'approved', NOW())
                 RETURNING {PAYMENT_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(listing.id)
            .bind(user_id)
            .bind(&trx_no)
            .bind(request.amount)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_trx_conflict)?;

            activate_listing(
                &mut tx,
                listing.id,
                ActivationReason::PaidApproved,
                Some(user_id),
            )
            .await?;

            tx.commit().await?;

            tracing::info!(
                payment_id = %payment.id,
                listing_id = %listing.id,
                "Payment auto-approved, listing activated"
            );
            payment
        } else {
            let payment = sqlx::query_as::<_, Payment>(&format!(
                "INSERT INTO payments (id, listing_id, submitted_by, trx_no, amount)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {PAYMENT_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(listing.id)
            .bind(user_id)
            .bind(&trx_no)
            .bind(request.amount)
            .fetch_one(&self.db_pool)
            .await
            .map_err(map_trx_conflict)?;

            tracing::info!(
                payment_id = %payment.id,
                listing_id = %listing.id,
                "Payment submitted, awaiting review"
            );
            payment
        };

        Ok(payment.into())
    }

    /// Approve a pending claim and activate its listing, atomically.
    pub async fn approve(&self, payment_id: Uuid, admin_id: Uuid) -> ApiResult<PaymentResponse> {
        let mut tx = self.db_pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE"
        ))
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment".to_string()))?;

        if payment.status != PaymentStatus::Pending {
            return Err(ApiError::Conflict("Payment already finalized".to_string()));
        }

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET status = 'approved', approved_by = $2, approved_at = NOW()
             WHERE id = $1
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment_id)
        .bind(admin_id)
        .fetch_one(&mut *tx)
        .await?;

        activate_listing(
            &mut tx,
            payment.listing_id,
            ActivationReason::PaidApproved,
            Some(admin_id),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment_id,
            listing_id = %payment.listing_id,
            admin_id = %admin_id,
            "Payment approved, listing activated"
        );
        Ok(payment.into())
    }

    /// Reject a pending claim. Finalizes the payment only; the listing stays
    /// pending and a new submission with a fresh transaction number is the
    /// retry path. The reviewer is recorded in `approved_by`.
    pub async fn reject(&self, payment_id: Uuid, admin_id: Uuid) -> ApiResult<PaymentResponse> {
        let mut tx = self.db_pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE"
        ))
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment".to_string()))?;

        if payment.status != PaymentStatus::Pending {
            return Err(ApiError::Conflict("Payment already finalized".to_string()));
        }

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET status = 'rejected', approved_by = $2, approved_at = NOW()
             WHERE id = $1
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment_id)
        .bind(admin_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(payment_id = %payment_id, admin_id = %admin_id, "Payment rejected");
        Ok(payment.into())
    }

    /// Review queue, filterable by status.
    pub async fn admin_list(
        &self,
        query: &AdminPaymentQuery,
    ) -> ApiResult<PaginatedResponse<PaymentResponse>> {
        let pagination = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (offset, limit) = pagination.resolve();

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM payments");
        let mut list_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments"));

        if let Some(status) = query.status {
            count_builder.push(" WHERE status = ").push_bind(status);
            list_builder.push(" WHERE status = ").push_bind(status);
        }

        list_builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;
        let payments = list_builder
            .build_query_as::<Payment>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(PaginatedResponse::new(
            payments.into_iter().map(PaymentResponse::from).collect(),
            total,
            &pagination,
        ))
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
}

fn map_trx_conflict(err: sqlx::Error) -> ApiError {
    if is_unique_violation(&err, "payments_trx_no_key") {
        ApiError::DuplicateTransaction
    } else {
        err.into()
    }
}
