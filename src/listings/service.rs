use std::path::Path;

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::listings::model::{
    ActivationReason, AdminListingQuery, AdminStatusRequest, BrowseQuery, CreateListingRequest,
    Listing, ListingResponse, UpdateListingRequest,
};
use crate::models::{PaginatedResponse, PaginationParams};

pub(crate) const LISTING_COLUMNS: &str =
    "id, owner_id, title, description, category, price, is_active, \
     is_featured, is_sold, images, created_at, updated_at";

/// Who is looking at a listing; pending listings are visible to the owner
/// and admins only.
#[derive(Debug, Clone, Copy)]
pub enum ListingViewer {
    Guest,
    Account(Uuid),
    Admin,
}

/// Listing lifecycle: create pending, edit resets, activate via the
/// publication paths, admin override, delete with cascade.
pub struct ListingService {
    db_pool: PgPool,
    upload_dir: String,
}

impl ListingService {
    pub fn new(db_pool: PgPool, upload_dir: String) -> Self {
        Self {
            db_pool,
            upload_dir,
        }
    }

    /// New listings always start inactive; publication happens through
    /// payment approval, coupon redemption or an admin override.
    pub async fn create(
        &self,
        owner_id: Uuid,
        request: CreateListingRequest,
    ) -> ApiResult<ListingResponse> {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            "INSERT INTO listings (id, owner_id, title, description, category, price, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(request.title.trim())
        .bind(request.description.trim())
        .bind(request.category.trim().to_lowercase())
        .bind(request.price)
        .bind(&request.images)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(listing_id = %listing.id, owner_id = %owner_id, "Listing created, pending publication");
        Ok(listing.into())
    }

    pub async fn get(&self, listing_id: Uuid) -> ApiResult<Listing> {
        sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(listing_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing".to_string()))
    }

    /// Detail view. Pending listings 404 for everyone except the owner and
    /// admins, so their existence does not leak.
    pub async fn get_detail(
        &self,
        listing_id: Uuid,
        viewer: ListingViewer,
    ) -> ApiResult<ListingResponse> {
        let listing = self.get(listing_id).await?;

        let visible = listing.is_active
            || match viewer {
                ListingViewer::Admin => true,
                ListingViewer::Account(account_id) => listing.owner_id == account_id,
                ListingViewer::Guest => false,
            };

        if !visible {
            return Err(ApiError::NotFound("Listing".to_string()));
        }
        Ok(listing.into())
    }

    /// Public browse: active listings only, newest first with featured
    /// listings on top, optional category filter.
    pub async fn browse_public(
        &self,
        query: &BrowseQuery,
    ) -> ApiResult<PaginatedResponse<ListingResponse>> {
        let pagination = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (offset, limit) = pagination.resolve();

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM listings WHERE is_active = TRUE");
        let mut list_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE is_active = TRUE"
        ));

        if let Some(category) = query.category.as_deref() {
            count_builder.push(" AND category = ").push_bind(category);
            list_builder.push(" AND category = ").push_bind(category);
        }

        list_builder
            .push(" ORDER BY is_featured DESC, created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;
        let listings = list_builder
            .build_query_as::<Listing>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(PaginatedResponse::new(
            listings.into_iter().map(ListingResponse::from).collect(),
            total,
            &pagination,
        ))
    }

    /// The caller's own listings in every state.
    pub async fn list_mine(
        &self,
        owner_id: Uuid,
        pagination: &PaginationParams,
    ) -> ApiResult<PaginatedResponse<ListingResponse>> {
        let (offset, limit) = pagination.resolve();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.db_pool)
            .await?;

        let listings = sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE owner_id = $1
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(PaginatedResponse::new(
            listings.into_iter().map(ListingResponse::from).collect(),
            total,
            pagination,
        ))
    }

    /// Admin review queue, filterable by publication state.
    pub async fn admin_list(
        &self,
        query: &AdminListingQuery,
    ) -> ApiResult<PaginatedResponse<ListingResponse>> {
        let is_active = review_filter(query.status.as_deref())?;
        let pagination = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (offset, limit) = pagination.resolve();

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM listings");
        let mut list_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {LISTING_COLUMNS} FROM listings"));

        if let Some(active) = is_active {
            count_builder.push(" WHERE is_active = ").push_bind(active);
            list_builder.push(" WHERE is_active = ").push_bind(active);
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
        let listings = list_builder
            .build_query_as::<Listing>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(PaginatedResponse::new(
            listings.into_iter().map(ListingResponse::from).collect(),
            total,
            &pagination,
        ))
    }

    /// Owner edit. Any edit resets the listing to pending, whatever state
    /// it was in.
    pub async fn update_by_owner(
        &self,
        listing_id: Uuid,
        owner_id: Uuid,
        request: UpdateListingRequest,
    ) -> ApiResult<ListingResponse> {
        let listing = self.get(listing_id).await?;
        listing.ensure_owned_by(owner_id)?;

        let updated = sqlx::query_as::<_, Listing>(&format!(
            "UPDATE listings SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                price = COALESCE($5, price),
                images = COALESCE($6, images),
                is_active = FALSE,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(listing_id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(request.description.as_deref().map(str::trim))
        .bind(
            request
                .category
                .as_deref()
                .map(|c| c.trim().to_lowercase()),
        )
        .bind(request.price)
        .bind(request.images)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(listing_id = %listing_id, "Listing edited, visibility reset to pending");
        Ok(updated.into())
    }

    /// Owner sold-toggle. Flips `is_sold` only; publication state is
    /// untouched.
    pub async fn toggle_sold(&self, listing_id: Uuid, owner_id: Uuid) -> ApiResult<ListingResponse> {
        let listing = self.get(listing_id).await?;
        listing.ensure_owned_by(owner_id)?;

        let updated = sqlx::query_as::<_, Listing>(&format!(
            "UPDATE listings SET is_sold = NOT is_sold, updated_at = NOW()
             WHERE id = $1
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(listing_id)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(listing_id = %listing_id, is_sold = updated.is_sold, "Listing sold flag toggled");
        Ok(updated.into())
    }

    /// Admin visibility override; activating this way is audited as
    /// `admin_override`.
    pub async fn admin_set_status(
        &self,
        listing_id: Uuid,
        admin_id: Uuid,
        request: &AdminStatusRequest,
    ) -> ApiResult<ListingResponse> {
        if request.is_active.is_none() && request.is_featured.is_none() {
            return Err(ApiError::BadRequest("Nothing to update".to_string()));
        }

        let mut tx = self.db_pool.begin().await?;

        let listing = sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1 FOR UPDATE"
        ))
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing".to_string()))?;

        let new_active = request.is_active.unwrap_or(listing.is_active);
        let new_featured = request.is_featured.unwrap_or(listing.is_featured);

        let updated = sqlx::query_as::<_, Listing>(&format!(
            "UPDATE listings SET is_active = $2, is_featured = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(listing_id)
        .bind(new_active)
        .bind(new_featured)
        .fetch_one(&mut *tx)
        .await?;

        if new_active && !listing.is_active {
            record_activation(
                &mut tx,
                listing_id,
                ActivationReason::AdminOverride,
                Some(admin_id),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            listing_id = %listing_id,
            admin_id = %admin_id,
            is_active = new_active,
            is_featured = new_featured,
            "Listing status overridden by admin"
        );
        Ok(updated.into())
    }

    /// Owner delete: dependents and the listing row go in one transaction,
    /// then image files are unlinked best-effort. Activation audit rows
    /// survive.
    pub async fn delete_by_owner(&self, listing_id: Uuid, owner_id: Uuid) -> ApiResult<()> {
        let listing = self.get(listing_id).await?;
        listing.ensure_owned_by(owner_id)?;

        let mut tx = self.db_pool.begin().await?;

        sqlx::query("DELETE FROM favorites WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM offers WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM inspection_requests WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM payments WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        remove_image_files(&self.upload_dir, &listing.images).await;

        tracing::info!(listing_id = %listing_id, "Listing deleted with dependents");
        Ok(())
    }

    pub async fn add_favorite(&self, account_id: Uuid, listing_id: Uuid) -> ApiResult<()> {
        // 404s before the unique check so favorites of vanished listings fail cleanly
        self.get(listing_id).await?;

        sqlx::query("INSERT INTO favorites (id, account_id, listing_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(account_id)
            .bind(listing_id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "favorites_account_id_listing_id_key") {
                    ApiError::DuplicateFavorite
                } else {
                    e.into()
                }
            })?;

        Ok(())
    }

    pub async fn remove_favorite(&self, account_id: Uuid, listing_id: Uuid) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE account_id = $1 AND listing_id = $2")
            .bind(account_id)
            .bind(listing_id)
            .execute(&self.db_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Favorite".to_string()));
        }
        Ok(())
    }

    /// The favorited listings themselves, most recently saved first.
    pub async fn list_favorites(&self, account_id: Uuid) -> ApiResult<Vec<ListingResponse>> {
        let listings = sqlx::query_as::<_, Listing>(
            "SELECT l.* FROM listings l
             JOIN favorites f ON f.listing_id = l.id
             WHERE f.account_id = $1
             ORDER BY f.created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(listings.into_iter().map(ListingResponse::from).collect())
    }
}

fn review_filter(status: Option<&str>) -> Result<Option<bool>, ApiError> {
    match status {
        None => Ok(None),
        Some("active") => Ok(Some(true)),
        Some("pending") => Ok(Some(false)),
        Some(other) => Err(ApiError::BadRequest(format!(
            "Unknown status filter: {}",
            other
        ))),
    }
}

/// Flip a listing active and write the audit row, inside the caller's
/// transaction. Shared by payment approval and coupon redemption.
pub(crate) async fn activate_listing(
    tx: &mut Transaction<'_, Postgres>,
    listing_id: Uuid,
    reason: ActivationReason,
    actor_id: Option<Uuid>,
) -> ApiResult<()> {
    sqlx::query("UPDATE listings SET is_active = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(listing_id)
        .execute(&mut **tx)
        .await?;

    record_activation(tx, listing_id, reason, actor_id).await
}

/// Audit-row insert only; for paths that already updated the listing row.
pub(crate) async fn record_activation(
    tx: &mut Transaction<'_, Postgres>,
    listing_id: Uuid,
    reason: ActivationReason,
    actor_id: Option<Uuid>,
) -> ApiResult<()> {
    sqlx::query(
        "INSERT INTO listing_activations (id, listing_id, reason, actor_id)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(listing_id)
    .bind(reason)
    .bind(actor_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Best-effort unlink of uploaded image files; missing files are fine,
/// other failures are logged and swallowed.
pub async fn remove_image_files(upload_dir: &str, images: &[String]) {
    for image in images {
        let file_name = match image.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        let path = Path::new(upload_dir).join(file_name);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %err, "Failed to remove listing image");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_filter() {
        assert_eq!(review_filter(None).unwrap(), None);
        assert_eq!(review_filter(Some("active")).unwrap(), Some(true));
        assert_eq!(review_filter(Some("pending")).unwrap(), Some(false));
        assert!(review_filter(Some("archived")).is_err());
    }

    #[tokio::test]
    async fn test_remove_image_files_unlinks_and_ignores_missing() {
        let dir = std::env::temp_dir().join(format!("sayara-images-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("car.jpg");
        std::fs::write(&file, b"jpeg").unwrap();

        let images = vec![
            "uploads/car.jpg".to_string(),
            "uploads/never-existed.jpg".to_string(),
        ];
        remove_image_files(dir.to_str().unwrap(), &images).await;

        assert!(!file.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
