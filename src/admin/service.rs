use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::admin::model::{Admin, AdminLoginResponse, AdminResponse, CreateAdminRequest};
use crate::admin::permissions::{unknown_capabilities, AdminRole};
use crate::auth::jwt::generate_admin_token;
use crate::auth::throttle::{ThrottleDecision, ThrottleStore};
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::models::{Account, AccountResponse, PaginatedResponse, PaginationParams};

const ADMIN_COLUMNS: &str =
    "id, email, name, password_hash, role, permissions, is_active, last_seen, created_at";

const ACCOUNT_COLUMNS: &str =
    "id, phone, name, roles, is_active, password_hash, google_id, created_at, updated_at";

/// Admin identity, staff management and account moderation.
///
/// Listing review, payment approval and coupon administration live in their
/// own services; this one owns the `admins` table and the moderation
/// operations over `accounts`.
pub struct AdminService {
    db_pool: PgPool,
    jwt_secret: String,
    admin_token_ttl_days: i64,
    throttle: Arc<dyn ThrottleStore>,
    upload_dir: String,
}

impl AdminService {
    pub fn new(
        db_pool: PgPool,
        jwt_secret: String,
        admin_token_ttl_days: i64,
        throttle: Arc<dyn ThrottleStore>,
        upload_dir: String,
    ) -> Self {
        Self {
            db_pool,
            jwt_secret,
            admin_token_ttl_days,
            throttle,
            upload_dir,
        }
    }

    /// Admin login with throttling keyed on the caller identifier.
    ///
    /// Wrong email and wrong password both count as failures against the
    /// identifier and both return the same generic message.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        identifier: &str,
    ) -> ApiResult<AdminLoginResponse> {
        if let ThrottleDecision::Blocked { minutes_remaining } =
            self.throttle.is_allowed(identifier).await
        {
            return Err(ApiError::TemporarilyBlocked {
                minutes: minutes_remaining,
            });
        }

        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?;

        let admin = match admin {
            Some(admin) => admin,
            None => {
                self.throttle.record_failure(identifier).await;
                return Err(ApiError::Unauthorized(
                    "Invalid email or password".to_string(),
                ));
            }
        };

        if !bcrypt::verify(password, &admin.password_hash)? {
            self.throttle.record_failure(identifier).await;
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        if !admin.is_active {
            return Err(ApiError::AccountBlocked);
        }

        self.throttle.clear(identifier).await;

        sqlx::query("UPDATE admins SET last_seen = NOW() WHERE id = $1")
            .bind(admin.id)
            .execute(&self.db_pool)
            .await?;

        let token =
            generate_admin_token(&admin, &self.jwt_secret, self.admin_token_ttl_days)
                .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

        tracing::info!(admin_id = %admin.id, "Admin logged in");

        Ok(AdminLoginResponse {
            token,
            admin: admin.into(),
        })
    }

    /// Resolve an admin id from a verified token into a live admin row.
    ///
    /// Refreshes `last_seen` and reloads permissions in one round trip, so
    /// a permission revocation applies on the next request. Only active
    /// admins get the `last_seen` bump.
    pub async fn authenticate(&self, admin_id: Uuid) -> ApiResult<Admin> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "UPDATE admins SET last_seen = NOW()
             WHERE id = $1 AND is_active = TRUE
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(admin_id)
        .fetch_optional(&self.db_pool)
        .await?;

        if let Some(admin) = admin {
            return Ok(admin);
        }

        let existing: Option<bool> = sqlx::query_scalar("SELECT is_active FROM admins WHERE id = $1")
            .bind(admin_id)
            .fetch_optional(&self.db_pool)
            .await?;

        match existing {
            Some(_) => Err(ApiError::AccountBlocked),
            None => Err(ApiError::UserDeleted),
        }
    }

    /// Create the bootstrap super admin when the admins table is empty.
    pub async fn seed_default_admin(&self, email: &str, password: &str) -> ApiResult<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.db_pool)
            .await?;

        if count > 0 {
            return Ok(());
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        sqlx::query(
            "INSERT INTO admins (id, email, name, password_hash, role, permissions)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind("Super Admin")
        .bind(password_hash)
        .bind(AdminRole::SuperAdmin)
        .bind(Vec::<String>::new())
        .execute(&self.db_pool)
        .await?;

        tracing::info!(email, "Seeded default super admin");
        Ok(())
    }

    pub async fn create_admin(&self, request: CreateAdminRequest) -> ApiResult<AdminResponse> {
        let unknown = unknown_capabilities(&request.permissions);
        if !unknown.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Unknown permissions: {}",
                unknown.join(", ")
            )));
        }

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)?;

        let admin = sqlx::query_as::<_, Admin>(&format!(
            "INSERT INTO admins (id, email, name, password_hash, role, permissions)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.email.to_lowercase())
        .bind(&request.name)
        .bind(password_hash)
        .bind(request.role)
        .bind(&request.permissions)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "admins_email_key") {
                ApiError::Conflict("Email already registered".to_string())
            } else {
                e.into()
            }
        })?;

        tracing::info!(admin_id = %admin.id, role = ?admin.role, "Admin created");
        Ok(admin.into())
    }

    pub async fn list_admins(&self) -> ApiResult<Vec<AdminResponse>> {
        let admins = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db_pool)
        .await?;

        Ok(admins.into_iter().map(AdminResponse::from).collect())
    }

    pub async fn list_accounts(
        &self,
        pagination: &PaginationParams,
    ) -> ApiResult<PaginatedResponse<AccountResponse>> {
        let (offset, limit) = pagination.resolve();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.db_pool)
            .await?;

        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(PaginatedResponse::new(
            accounts.into_iter().map(AccountResponse::from).collect(),
            total,
            pagination,
        ))
    }

    /// Accounts carrying at least one service-provider role.
    pub async fn list_providers(
        &self,
        pagination: &PaginationParams,
    ) -> ApiResult<PaginatedResponse<AccountResponse>> {
        let (offset, limit) = pagination.resolve();

        let provider_roles = "'{mechanic,electrician,lawyer,inspection_center}'::account_role[]";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM accounts WHERE roles && {provider_roles}"
        ))
        .fetch_one(&self.db_pool)
        .await?;

        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE roles && {provider_roles}
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(PaginatedResponse::new(
            accounts.into_iter().map(AccountResponse::from).collect(),
            total,
            pagination,
        ))
    }

    /// Block or unblock an account. Blocked accounts fail authentication on
    /// their next request; already-issued tokens stop working immediately.
    pub async fn set_account_active(
        &self,
        account_id: Uuid,
        is_active: bool,
    ) -> ApiResult<AccountResponse> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET is_active = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(account_id)
        .bind(is_active)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account".to_string()))?;

        tracing::info!(account_id = %account.id, is_active, "Account active flag changed");
        Ok(account.into())
    }

    /// Delete an account and every row that references it, in one
    /// transaction. Listing images are unlinked best-effort after commit.
    pub async fn delete_account(&self, account_id: Uuid) -> ApiResult<()> {
        let mut tx = self.db_pool.begin().await?;

        let image_batches: Vec<Vec<String>> =
            sqlx::query_scalar("SELECT images FROM listings WHERE owner_id = $1")
                .bind(account_id)
                .fetch_all(&mut *tx)
                .await?;

        // Dependents of the account's own listings first.
        sqlx::query(
            "DELETE FROM favorites WHERE listing_id IN (SELECT id FROM listings WHERE owner_id = $1)",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM offers WHERE listing_id IN (SELECT id FROM listings WHERE owner_id = $1)",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM inspection_requests WHERE listing_id IN (SELECT id FROM listings WHERE owner_id = $1)",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM payments WHERE listing_id IN (SELECT id FROM listings WHERE owner_id = $1)",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM listing_activations WHERE listing_id IN (SELECT id FROM listings WHERE owner_id = $1)",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        // Activity the account left on other people's listings.
        sqlx::query("DELETE FROM favorites WHERE account_id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM offers WHERE buyer_id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM inspection_requests WHERE buyer_id = $1 OR seller_id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM payments WHERE submitted_by = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM coupon_usages WHERE user_id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM listings WHERE owner_id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(ApiError::NotFound("Account".to_string()));
        }

        tx.commit().await?;

        for images in &image_batches {
            crate::listings::remove_image_files(&self.upload_dir, images).await;
        }

        tracing::info!(account_id = %account_id, "Account deleted with dependents");
        Ok(())
    }
}
