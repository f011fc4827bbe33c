use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::coupons::model::{
    ApplyCouponRequest, Coupon, CouponResponse, CouponValidationResponse, CreateCouponRequest,
};
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::listings::model::{ActivationReason, Listing};
use crate::listings::service::{activate_listing, LISTING_COLUMNS};
use crate::listings::ListingResponse;

const COUPON_COLUMNS: &str =
    "id, code, discount_percent, max_uses, used_count, expires_at, is_active, created_at";

// No I/O/0/1 so codes survive being read over the phone.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 8;

/// Coupon publication path: a valid code activates the owner's listing
/// immediately, with no admin review. That asymmetry with the cash path is
/// long-standing client-visible behavior and is kept.
pub struct CouponService {
    db_pool: PgPool,
}

impl CouponService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Read-only validation: reports the discount if the caller could
    /// redeem this code right now. Nothing is reserved.
    pub async fn validate(&self, user_id: Uuid, code: &str) -> ApiResult<CouponValidationResponse> {
        let coupon = self.find_redeemable(code).await?;
        check_redeemable(&coupon, Utc::now())?;
        self.ensure_unused_by(coupon.id, user_id).await?;

        Ok(CouponValidationResponse {
            code: coupon.code,
            discount_percent: coupon.discount_percent,
        })
    }

    /// Redeem a code against a listing the caller owns.
    ///
    /// Every validation check runs again here; the conditional increment
    /// closes the validate/apply race, and the usage-row unique constraint
    /// closes the double-apply race.
    pub async fn apply(
        &self,
        user_id: Uuid,
        request: &ApplyCouponRequest,
    ) -> ApiResult<ListingResponse> {
        let coupon = self.find_redeemable(&request.code).await?;
        check_redeemable(&coupon, Utc::now())?;
        self.ensure_unused_by(coupon.id, user_id).await?;

        let listing = self.load_listing(request.listing_id).await?;
        listing.ensure_owned_by(user_id)?;

        let mut tx = self.db_pool.begin().await?;

        sqlx::query(
            "INSERT INTO coupon_usages (id, coupon_id, user_id, listing_id)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(coupon.id)
        .bind(user_id)
        .bind(listing.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "coupon_usages_coupon_id_user_id_key") {
                ApiError::DuplicateCouponUsage
            } else {
                e.into()
            }
        })?;

        let incremented = sqlx::query(
            "UPDATE coupons SET used_count = used_count + 1
             WHERE id = $1 AND (max_uses IS NULL OR used_count < max_uses)",
        )
        .bind(coupon.id)
        .execute(&mut *tx)
        .await?;

        if incremented.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(ApiError::ExhaustedCoupon);
        }

        activate_listing(
            &mut tx,
            listing.id,
            ActivationReason::CouponRedeemed,
            Some(user_id),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            coupon_id = %coupon.id,
            listing_id = %listing.id,
            user_id = %user_id,
            "Coupon redeemed, listing activated"
        );

        let listing = self.load_listing(request.listing_id).await?;
        Ok(listing.into())
    }

    pub async fn create(&self, request: CreateCouponRequest) -> ApiResult<CouponResponse> {
        let code = match &request.code {
            Some(code) => code.trim().to_uppercase(),
            None => generate_code(),
        };

        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "INSERT INTO coupons (id, code, discount_percent, max_uses, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&code)
        .bind(request.discount_percent)
        .bind(request.max_uses)
        .bind(request.expires_at)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "coupons_code_key") {
                ApiError::Conflict("Coupon code already exists".to_string())
            } else {
                e.into()
            }
        })?;

        tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created");
        Ok(coupon.into())
    }

    pub async fn list(&self) -> ApiResult<Vec<CouponResponse>> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db_pool)
        .await?;

        Ok(coupons.into_iter().map(CouponResponse::from).collect())
    }

    /// Uppercase lookup; absent and inactive codes are indistinguishable to
    /// the caller.
    async fn find_redeemable(&self, code: &str) -> ApiResult<Coupon> {
        let code = code.trim().to_uppercase();

        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1"
        ))
        .bind(&code)
        .fetch_optional(&self.db_pool)
        .await?;

        match coupon {
            Some(coupon) if coupon.is_active => Ok(coupon),
            _ => Err(ApiError::InvalidCoupon),
        }
    }

    async fn ensure_unused_by(&self, coupon_id: Uuid, user_id: Uuid) -> ApiResult<()> {
        let used: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM coupon_usages WHERE coupon_id = $1 AND user_id = $2)",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        if used {
            return Err(ApiError::DuplicateCouponUsage);
        }
        Ok(())
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

/// Expiry and quota checks shared by validate and apply.
fn check_redeemable(coupon: &Coupon, now: DateTime<Utc>) -> ApiResult<()> {
    if coupon.expires_at.is_some_and(|expires| expires < now) {
        return Err(ApiError::ExpiredCoupon);
    }
    if coupon
        .max_uses
        .is_some_and(|max| coupon.used_count >= max)
    {
        return Err(ApiError::ExhaustedCoupon);
    }
    Ok(())
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_coupon() -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "SUMMER24".to_string(),
            discount_percent: 100,
            max_uses: Some(10),
            used_count: 0,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_fresh_coupon_redeemable() {
        assert!(check_redeemable(&sample_coupon(), Utc::now()).is_ok());
    }

    #[test]
    fn test_expired_coupon() {
        let coupon = Coupon {
            expires_at: Some(Utc::now() - Duration::hours(1)),
            ..sample_coupon()
        };
        assert!(matches!(
            check_redeemable(&coupon, Utc::now()),
            Err(ApiError::ExpiredCoupon)
        ));
    }

    #[test]
    fn test_future_expiry_still_valid() {
        let coupon = Coupon {
            expires_at: Some(Utc::now() + Duration::hours(1)),
            ..sample_coupon()
        };
        assert!(check_redeemable(&coupon, Utc::now()).is_ok());
    }

    #[test]
    fn test_exhausted_coupon() {
        let coupon = Coupon {
            max_uses: Some(10),
            used_count: 10,
            ..sample_coupon()
        };
        assert!(matches!(
            check_redeemable(&coupon, Utc::now()),
            Err(ApiError::ExhaustedCoupon)
        ));
    }

    #[test]
    fn test_unlimited_uses_never_exhausts() {
        let coupon = Coupon {
            max_uses: None,
            used_count: 1_000_000,
            ..sample_coupon()
        };
        assert!(check_redeemable(&coupon, Utc::now()).is_ok());
    }

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
