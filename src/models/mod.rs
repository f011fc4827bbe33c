//! Data models shared across the Sayara backend
//!
//! Domain modules (listings, payments, coupons, offers) own their own models;
//! this module holds the account entity and the auth-facing DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// Account model
///
/// `password_hash` and `google_id` never leave the server; API responses go
/// through [`AccountResponse`].
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct Account {
    pub id: Uuid,
    pub phone: String,
    pub name: String,
    pub roles: Vec<AccountRole>,
    pub is_active: bool,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// True when this account holds any service-provider role.
    pub fn is_provider(&self) -> bool {
        self.roles.iter().any(|r| r.is_provider())
    }
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            phone: account.phone,
            name: account.name,
            roles: account.roles,
            is_active: account.is_active,
            created_at: account.created_at,
        }
    }
}

/// Account roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "account_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Buyer,
    Seller,
    Mechanic,
    Electrician,
    Lawyer,
    InspectionCenter,
}

impl sqlx::postgres::PgHasArrayType for AccountRole {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_account_role")
    }
}

impl AccountRole {
    /// Service-provider roles, listed in the admin providers view.
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            AccountRole::Mechanic
                | AccountRole::Electrician
                | AccountRole::Lawyer
                | AccountRole::InspectionCenter
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Buyer => "buyer",
            AccountRole::Seller => "seller",
            AccountRole::Mechanic => "mechanic",
            AccountRole::Electrician => "electrician",
            AccountRole::Lawyer => "lawyer",
            AccountRole::InspectionCenter => "inspection_center",
        }
    }
}

/// Pagination parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

impl PaginationParams {
    /// Resolve page/limit into a SQL offset and clamped limit.
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1) as i64;
        let limit = self.limit.unwrap_or(20).clamp(1, 100) as i64;
        ((page - 1) * limit, limit)
    }
}

/// Paginated response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i32,
    pub limit: i32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, params: &PaginationParams) -> Self {
        Self {
            data,
            total,
            page: params.page.unwrap_or(1).max(1),
            limit: params.limit.unwrap_or(20).clamp(1, 100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_roles() {
        assert!(!AccountRole::Buyer.is_provider());
        assert!(!AccountRole::Seller.is_provider());
        assert!(AccountRole::Mechanic.is_provider());
        assert!(AccountRole::Electrician.is_provider());
        assert!(AccountRole::Lawyer.is_provider());
        assert!(AccountRole::InspectionCenter.is_provider());
    }

    #[test]
    fn test_role_serialization_is_snake_case() {
        let json = serde_json::to_string(&AccountRole::InspectionCenter).unwrap();
        assert_eq!(json, "\"inspection_center\"");
    }

    #[test]
    fn test_pagination_resolve() {
        let params = PaginationParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.resolve(), (0, 20));

        let params = PaginationParams {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(params.resolve(), (20, 10));

        // Out-of-range values are clamped
        let params = PaginationParams {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(params.resolve(), (0, 100));
    }
}
