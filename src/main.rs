//! Bundle Backend Server
//!
//! Main entry point for the Bundle personal-finance backend: user profiles,
//! loans and repayments, risk-pooled bundles, deposits through the payment
//! gateway, and the community story feed.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use bundle_server::activity_service::ActivityService;
use bundle_server::auth::SessionVerifier;
use bundle_server::bundle::BundleService;
use bundle_server::config::Config;
use bundle_server::deposit::{DepositService, PayPalClient};
use bundle_server::loan_service::LoanService;
use bundle_server::story_service::StoryService;
use bundle_server::user_service::UserService;
use bundle_server::{db, middleware, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting Bundle backend");

    // Initialize database connection pool and schema
    let db_pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = db::run_migrations(&db_pool).await {
        tracing::error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    // Payment gateway client, absent when credentials are not configured
    let gateway = config.gateway.clone().map(PayPalClient::new);
    if gateway.is_none() {
        tracing::warn!("Payment gateway credentials not set; deposits are disabled");
    }

    // Initialize services
    let user_service = Arc::new(UserService::new(db_pool.clone()));
    let activity_service = Arc::new(ActivityService::new(db_pool.clone()));
    let loan_service = Arc::new(LoanService::new(
        db_pool.clone(),
        ActivityService::new(db_pool.clone()),
        config.max_loan_amount_cents,
        config.max_loan_duration_weeks,
    ));
    let bundle_service = Arc::new(BundleService::new(db_pool.clone()));
    let deposit_service = Arc::new(DepositService::new(db_pool.clone(), gateway));
    let story_service = Arc::new(StoryService::new(db_pool.clone()));
    let session_verifier = SessionVerifier::new(config.session_secret.clone());

    // Create shared app state
    let app_state = AppState::new(
        user_service,
        loan_service,
        bundle_service,
        activity_service,
        deposit_service,
        story_service,
        session_verifier,
    );

    // Clone db_pool for health check
    let health_db_pool = db_pool.clone();

    // Create the app router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::user_routes())
        .merge(routes::loan_routes())
        .merge(routes::bundle_routes())
        .merge(routes::activity_routes())
        .merge(routes::deposit_routes())
        .merge(routes::story_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(&config));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn root() -> &'static str {
    "Bundle API Server"
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
    let db_status = match db::check_health(&pool).await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let status = if db_status == "connected" {
        "healthy"
    } else {
        "unhealthy"
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        database: db_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins_str = config.cors_allowed_origins.clone().unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
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
