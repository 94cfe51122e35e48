use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use portal::config::{AppConfig, StoreBackend};
use portal::handlers;
use portal::services::store::http::HttpConnector;
use portal::services::store::memory::{MemoryBackend, MemoryConnector};
use portal::services::store::StoreConnector;
use portal::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let connector: Box<dyn StoreConnector> = match config.store_backend {
        StoreBackend::Memory => {
            let backend = match &config.memory_seed_path {
                Some(path) => {
                    let seed = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {path}"))?;
                    MemoryBackend::from_json(&seed)?
                }
                None => MemoryBackend::new(),
            };
            tracing::info!("using in-memory reservation store");
            Box::new(MemoryConnector::new(Arc::new(backend)))
        }
        StoreBackend::Http => {
            tracing::info!("using reservation API at {}", config.reservation_api_url);
            Box::new(HttpConnector::new(
                &config.reservation_api_url,
                Duration::from_secs(config.request_timeout_secs),
            )?)
        }
    };

    let state = Arc::new(AppState::new(config.clone(), connector));

    let mut app = handlers::router(state).layer(TraceLayer::new_for_http());

    if let Some(origin) = &config.frontend_origin {
        let origin: HeaderValue = origin.parse().context("invalid FRONTEND_ORIGIN")?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );
    }

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
