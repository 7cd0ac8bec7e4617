//! Tollgate service entry point.
//!
//! Loads configuration, selects the entitlement store backend and the
//! settlement gateway, then serves the billing API.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tollgate::adapters::http::settlement::{
    settlement_router, GatewayPublicInfo, SettlementAppState,
};
use tollgate::adapters::paypal::{PayPalConfig, PayPalEnvironment, PayPalGateway, SimulatedGateway};
use tollgate::adapters::storage::{JsonFileStore, PostgresEntitlementStore};
use tollgate::config::{AppConfig, GatewayConfig, GatewayMode, ServerConfig, StorageBackend};
use tollgate::ports::{EntitlementStore, SettlementGateway};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Tollgate exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);

    info!("Starting tollgate v{}", env!("CARGO_PKG_VERSION"));
    config.validate()?;

    let store = build_store(&config).await?;
    let gateway = build_gateway(&config.gateway);
    info!(provider = gateway.provider_name(), "Settlement gateway ready");

    let state = SettlementAppState::new(store, gateway, gateway_public_info(&config.gateway));

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", settlement_router())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Install the log subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Select and connect the entitlement store backend.
async fn build_store(
    config: &AppConfig,
) -> Result<Arc<dyn EntitlementStore>, Box<dyn std::error::Error>> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .min_connections(config.database.min_connections)
                .max_connections(config.database.max_connections)
                .acquire_timeout(config.database.acquire_timeout())
                .idle_timeout(config.database.idle_timeout())
                .connect(&config.database.url)
                .await?;
            info!("Postgres connection established");

            if config.database.run_migrations {
                sqlx::migrate!("./migrations").run(&pool).await?;
                info!("Database migrations applied");
            }

            Ok(Arc::new(PostgresEntitlementStore::new(pool)))
        }
        StorageBackend::File => {
            info!(path = %config.storage.file_path, "Using flat-file entitlement store");
            Ok(Arc::new(JsonFileStore::new(&config.storage.file_path)))
        }
    }
}

/// Select the settlement gateway implementation.
fn build_gateway(config: &GatewayConfig) -> Arc<dyn SettlementGateway> {
    if config.simulation_enabled() {
        if config.simulate {
            info!("Simulation flag set; using the simulated gateway");
        } else {
            tracing::warn!("No gateway credentials configured; using the simulated gateway");
        }
        return Arc::new(SimulatedGateway::new());
    }

    let environment = match config.mode {
        GatewayMode::Live => PayPalEnvironment::Live,
        GatewayMode::Sandbox => PayPalEnvironment::Sandbox,
    };

    let mut paypal = PayPalConfig::new(config.client_id.clone(), config.client_secret.clone())
        .with_environment(environment)
        .with_brand_name(config.brand_name.clone())
        .with_redirect_urls(config.return_url.clone(), config.cancel_url.clone())
        .with_timeout(Duration::from_secs(config.request_timeout_secs));

    if let Some(webhook_id) = &config.webhook_id {
        paypal = paypal.with_webhook_id(webhook_id.clone());
    }
    if let Some(product_id) = &config.product_id {
        paypal = paypal.with_product_id(product_id.clone());
    }
    if let Some(plan_id) = &config.plan_id {
        paypal = paypal.with_plan_id(plan_id.clone());
    }

    Arc::new(PayPalGateway::new(paypal))
}

/// Facts the configuration endpoint may expose. Never the secret.
fn gateway_public_info(config: &GatewayConfig) -> GatewayPublicInfo {
    let environment = match config.mode {
        GatewayMode::Live => "live",
        GatewayMode::Sandbox => "sandbox",
    };

    GatewayPublicInfo {
        environment: environment.to_string(),
        configured: config.has_credentials(),
        simulation: config.simulation_enabled(),
        client_id: config
            .has_credentials()
            .then(|| config.client_id.clone()),
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-user-id"),
        ])
        .allow_origin(origins)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown handler: {}", error);
        return;
    }
    info!("Shutdown signal received");
}
