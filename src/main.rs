//! Sayara Backend Server
//!
//! Car-marketplace backend: accounts and Google sign-in, the listing
//! lifecycle with paid publication, coupons, offers and inspections, and
//! the admin panel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use sayara_server::admin::AdminService;
use sayara_server::auth::{
    AuthService, GoogleTokenVerifier, InMemoryThrottleStore, ThrottlePolicy,
};
use sayara_server::config::Config;
use sayara_server::coupons::CouponService;
use sayara_server::db;
use sayara_server::listings::ListingService;
use sayara_server::middleware::{self, RateLimiter};
use sayara_server::offers::OfferService;
use sayara_server::payments::PaymentService;
use sayara_server::routes;
use sayara_server::settings::SettingsService;
use sayara_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        "Starting Sayara backend"
    );

    let db_pool = db::create_pool(&config)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&db_pool)
        .await
        .context("Failed to run migrations")?;

    let throttle = Arc::new(InMemoryThrottleStore::new(ThrottlePolicy {
        max_attempts: config.login_max_attempts,
        block_duration: chrono::Duration::minutes(config.login_block_minutes),
    }));

    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        config.jwt_secret.clone(),
        config.user_token_ttl_days,
        config.optional_auth_strict,
        GoogleTokenVerifier::new(config.google_client_id.clone()),
    ));
    let admin_service = Arc::new(AdminService::new(
        db_pool.clone(),
        config.jwt_secret.clone(),
        config.admin_token_ttl_days,
        throttle.clone(),
        config.upload_dir.clone(),
    ));
    let settings_service = Arc::new(SettingsService::new(db_pool.clone()));
    let listing_service = Arc::new(ListingService::new(
        db_pool.clone(),
        config.upload_dir.clone(),
    ));
    let payment_service = Arc::new(PaymentService::new(
        db_pool.clone(),
        settings_service.clone(),
    ));
    let coupon_service = Arc::new(CouponService::new(db_pool.clone()));
    let offer_service = Arc::new(OfferService::new(db_pool.clone()));

    settings_service
        .seed_defaults()
        .await
        .context("Failed to seed publication settings")?;
    admin_service
        .seed_default_admin(&config.seed_admin_email, &config.seed_admin_password)
        .await
        .context("Failed to seed default admin")?;

    let app_state = AppState {
        auth_service,
        admin_service,
        listing_service,
        payment_service,
        coupon_service,
        offer_service,
        settings_service,
        db_pool: db_pool.clone(),
    };

    // Initialize rate limiter
    let rate_limiter = RateLimiter::new(config.rate_limit_rps);

    // Background maintenance: drop idle throttle records and rate-limit buckets
    let throttle_maintenance = throttle.clone();
    let limiter_maintenance = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            throttle_maintenance.purge_stale().await;
            limiter_maintenance.cleanup(Duration::from_secs(600)).await;
        }
    });

    // Clone db_pool for health check
    let health_db_pool = db_pool.clone();

    // Create the app router
    let rate_limiter_mw = rate_limiter.clone();
    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::auth_routes())
        .merge(routes::user_routes())
        .merge(routes::listing_routes())
        .merge(routes::payment_routes())
        .merge(routes::coupon_routes())
        .merge(routes::offer_routes())
        .merge(routes::favorite_routes())
        .merge(routes::admin_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(axum::middleware::from_fn(move |req, next| {
            let limiter = rate_limiter_mw.clone();
            middleware::rate_limit_layer(limiter)(req, next)
        }))
        .layer(configure_cors(&config));

    if config.environment.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // ConnectInfo feeds the rate limiter and the admin-login throttle when no
    // proxy headers are present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn root() -> &'static str {
    "Sayara API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> axum::Json<HealthResponse> {
    let database = match db::check_health(&pool).await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let status = if database == "connected" {
        "healthy"
    } else {
        "unhealthy"
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(config: &Config) -> CorsLayer {
    let Some(allowed) = config
        .cors_allowed_origins
        .as_deref()
        .filter(|s| !s.is_empty())
    else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
