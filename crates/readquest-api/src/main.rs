//! ReadQuest API server entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use readquest_api::config::AppConfig;
use readquest_api::error::AppError;
use readquest_api::state::AppState;
use readquest_api::telemetry;
use readquest_catalog::{Catalog, UnlockPolicy};
use readquest_core::clock::SystemClock;
use readquest_core::rng::SystemRng;
use readquest_event_store::{PgEventRepository, run_migrations};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!(mode = %config.mode, "Starting ReadQuest API server");

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::embedded()?,
    };
    tracing::info!(stories = catalog.stories().len(), "catalog loaded");

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(Mutex::new(SystemRng::from_entropy())),
        Arc::new(PgEventRepository::new(pool)),
        Arc::new(catalog),
        UnlockPolicy::new(config.mode),
    );

    // TODO: Replace CorsLayer::permissive() with the app's origins once they are fixed.
    let app = readquest_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    telemetry.shutdown();
    served.map_err(AppError::from)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
