//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::admin::AdminService;
use crate::auth::AuthService;
use crate::coupons::CouponService;
use crate::listings::ListingService;
use crate::offers::OfferService;
use crate::payments::PaymentService;
use crate::settings::SettingsService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub admin_service: Arc<AdminService>,
    pub listing_service: Arc<ListingService>,
    pub payment_service: Arc<PaymentService>,
    pub coupon_service: Arc<CouponService>,
    pub offer_service: Arc<OfferService>,
    pub settings_service: Arc<SettingsService>,
    pub db_pool: sqlx::PgPool,
}

// The auth extractors take their services through FromRef so they work
// against any state type.

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<AdminService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.admin_service.clone()
    }
}
