//! Publication settings
//!
//! Admin-tunable knobs for the publication gate, stored as a single JSONB
//! row in `app_settings`. Missing or unreadable rows fall back to defaults
//! so a fresh database behaves sensibly before the seed runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{ApiError, ApiResult};

const PUBLICATION_KEY: &str = "publication";

/// Minimum listing fees in the smallest currency unit, with optional
/// per-category overrides.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingFees {
    pub default: i64,
    pub categories: HashMap<String, i64>,
}

impl Default for ListingFees {
    fn default() -> Self {
        Self {
            default: 500,
            categories: HashMap::new(),
        }
    }
}

impl ListingFees {
    /// The minimum fee for a category, falling back to the default.
    pub fn fee_for(&self, category: &str) -> i64 {
        self.categories
            .get(category)
            .copied()
            .unwrap_or(self.default)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicationSettings {
    /// When true, a sufficient payment activates the listing immediately
    /// instead of entering the admin approval queue.
    pub auto_approve_payments: bool,
    /// Publishing stays free while the registered account count is below
    /// this limit.
    pub free_listing_limit: i64,
    pub listing_fees: ListingFees,
}

impl Default for PublicationSettings {
    fn default() -> Self {
        Self {
            auto_approve_payments: false,
            free_listing_limit: 100,
            listing_fees: ListingFees::default(),
        }
    }
}

pub struct SettingsService {
    db_pool: PgPool,
}

impl SettingsService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Write the default publication settings if none are stored yet.
    pub async fn seed_defaults(&self) -> ApiResult<()> {
        let defaults = serde_json::to_value(PublicationSettings::default())?;

        let result = sqlx::query(
            "INSERT INTO app_settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO NOTHING",
        )
        .bind(PUBLICATION_KEY)
        .bind(defaults)
        .execute(&self.db_pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!("Seeded default publication settings");
        }
        Ok(())
    }

    pub async fn publication(&self) -> ApiResult<PublicationSettings> {
        let value: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
                .bind(PUBLICATION_KEY)
                .fetch_optional(&self.db_pool)
                .await?;

        match value {
            Some(value) => match serde_json::from_value(value) {
                Ok(settings) => Ok(settings),
                Err(err) => {
                    tracing::warn!(error = %err, "Stored publication settings unreadable, using defaults");
                    Ok(PublicationSettings::default())
                }
            },
            None => Ok(PublicationSettings::default()),
        }
    }

    pub async fn update_publication(
        &self,
        settings: PublicationSettings,
    ) -> ApiResult<PublicationSettings> {
        if settings.free_listing_limit < 0 {
            return Err(ApiError::BadRequest(
                "freeListingLimit cannot be negative".to_string(),
            ));
        }
        if settings.listing_fees.default < 0
            || settings.listing_fees.categories.values().any(|fee| *fee < 0)
        {
            return Err(ApiError::BadRequest(
                "Listing fees cannot be negative".to_string(),
            ));
        }

        sqlx::query(
            "INSERT INTO app_settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(PUBLICATION_KEY)
        .bind(serde_json::to_value(&settings)?)
        .execute(&self.db_pool)
        .await?;

        tracing::info!(
            auto_approve = settings.auto_approve_payments,
            free_limit = settings.free_listing_limit,
            "Publication settings updated"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PublicationSettings::default();
        assert!(!settings.auto_approve_payments);
        assert_eq!(settings.free_listing_limit, 100);
        assert_eq!(settings.listing_fees.default, 500);
    }

    #[test]
    fn test_fee_for_category_override() {
        let mut fees = ListingFees::default();
        fees.categories.insert("truck".to_string(), 900);

        assert_eq!(fees.fee_for("truck"), 900);
        assert_eq!(fees.fee_for("sedan"), 500);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: PublicationSettings =
            serde_json::from_str(r#"{"autoApprovePayments":true}"#).unwrap();

        assert!(settings.auto_approve_payments);
        assert_eq!(settings.free_listing_limit, 100);
        assert_eq!(settings.listing_fees.default, 500);
    }

    #[test]
    fn test_round_trip_camel_case() {
        let mut settings = PublicationSettings::default();
        settings
            .listing_fees
            .categories
            .insert("suv".to_string(), 750);

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["freeListingLimit"], 100);
        assert_eq!(json["listingFees"]["default"], 500);
        assert_eq!(json["listingFees"]["categories"]["suv"], 750);

        let back: PublicationSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }
}
