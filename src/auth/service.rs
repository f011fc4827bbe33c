//! Authentication service
//!
//! Registration, phone+password login, and Google sign-in for marketplace
//! accounts. Admin authentication lives in `crate::admin`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::models::{
    Account, AccountRole, AuthTokensResponse, RegisterRequest, UpdateAccountRequest,
};

use super::google::{GoogleAuthError, GoogleTokenVerifier};
use super::jwt::generate_user_token;

const ACCOUNT_COLUMNS: &str =
    "id, phone, name, roles, is_active, password_hash, google_id, created_at, updated_at";

/// Authentication service for marketplace accounts
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    user_token_ttl_days: i64,
    optional_auth_strict: bool,
    google: GoogleTokenVerifier,
}

impl AuthService {
    pub fn new(
        db_pool: PgPool,
        jwt_secret: String,
        user_token_ttl_days: i64,
        optional_auth_strict: bool,
        google: GoogleTokenVerifier,
    ) -> Self {
        Self {
            db_pool,
            jwt_secret,
            user_token_ttl_days,
            optional_auth_strict,
            google,
        }
    }

    /// Register a new account and issue its first token.
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<AuthTokensResponse> {
        let roles = req.roles.unwrap_or_else(|| vec![AccountRole::Buyer]);
        let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)?;

        let account: Account = sqlx::query_as(&format!(
            r#"
            INSERT INTO accounts (id, phone, name, roles, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(req.phone.trim())
        .bind(req.name.trim())
        .bind(&roles)
        .bind(&password_hash)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "accounts_phone_key") {
                ApiError::Conflict("Phone number already registered".to_string())
            } else {
                e.into()
            }
        })?;

        self.issue_tokens(account)
    }

    /// Validate phone+password credentials and issue a token.
    pub async fn login(&self, phone: &str, password: &str) -> ApiResult<AuthTokensResponse> {
        let account: Option<Account> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE phone = $1"
        ))
        .bind(phone.trim())
        .fetch_optional(&self.db_pool)
        .await?;

        // A missing account, a Google-only account, and a wrong password all
        // produce the same response so credentials cannot be probed.
        let Some(account) = account else {
            return Err(ApiError::Unauthorized("Invalid phone or password".to_string()));
        };
        let Some(hash) = account.password_hash.as_deref() else {
            return Err(ApiError::Unauthorized("Invalid phone or password".to_string()));
        };
        if !bcrypt::verify(password, hash)? {
            return Err(ApiError::Unauthorized("Invalid phone or password".to_string()));
        }

        if !account.is_active {
            return Err(ApiError::AccountBlocked);
        }

        self.issue_tokens(account)
    }

    /// Verify a Google ID token, then find or register the matching account.
    pub async fn google_sign_in(&self, id_token: &str) -> ApiResult<AuthTokensResponse> {
        let profile = self.google.verify(id_token).await.map_err(|e| match e {
            GoogleAuthError::RequestFailed(msg) => ApiError::ExternalService(msg),
            other => ApiError::Unauthorized(other.to_string()),
        })?;

        let existing: Option<Account> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE google_id = $1"
        ))
        .bind(&profile.sub)
        .fetch_optional(&self.db_pool)
        .await?;

        if let Some(account) = existing {
            if !account.is_active {
                return Err(ApiError::AccountBlocked);
            }
            return self.issue_tokens(account);
        }

        // First sign-in: register with a placeholder phone the client is
        // expected to replace via the self-update endpoint.
        let name = profile.name.unwrap_or_else(|| "Google user".to_string());
        let placeholder_phone = format!("g-{}", profile.sub);

        let account: Account = sqlx::query_as(&format!(
            r#"
            INSERT INTO accounts (id, phone, name, roles, google_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&placeholder_phone)
        .bind(&name)
        .bind(vec![AccountRole::Buyer])
        .bind(&profile.sub)
        .fetch_one(&self.db_pool)
        .await?;

        self.issue_tokens(account)
    }

    /// Fetch an account row, `None` when it no longer exists.
    pub async fn find_account(&self, id: Uuid) -> ApiResult<Option<Account>> {
        let account = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(account)
    }

    /// Fetch an account that must exist.
    pub async fn get_account(&self, id: Uuid) -> ApiResult<Account> {
        self.find_account(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Account".to_string()))
    }

    /// Partial self-update; absent fields keep their current value.
    pub async fn update_account(
        &self,
        id: Uuid,
        req: UpdateAccountRequest,
    ) -> ApiResult<Account> {
        let password_hash = match &req.password {
            Some(password) => Some(bcrypt::hash(password, bcrypt::DEFAULT_COST)?),
            None => None,
        };

        let account: Option<Account> = sqlx::query_as(&format!(
            r#"
            UPDATE accounts
            SET name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                roles = COALESCE($4, roles),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(password_hash)
        .bind(req.roles)
        .fetch_optional(&self.db_pool)
        .await?;

        account.ok_or_else(|| ApiError::NotFound("Account".to_string()))
    }

    fn issue_tokens(&self, account: Account) -> ApiResult<AuthTokensResponse> {
        let token = generate_user_token(&account, &self.jwt_secret, self.user_token_ttl_days)
            .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokensResponse {
            token,
            user: account.into(),
        })
    }

    /// JWT secret (for middleware access)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Whether optional-auth rejects invalid tokens instead of downgrading
    /// the request to guest.
    pub fn optional_auth_strict(&self) -> bool {
        self.optional_auth_strict
    }

    /// Database pool (for extractor access)
    pub fn db_pool(&self) -> &PgPool {
        &self.db_pool
    }
}
