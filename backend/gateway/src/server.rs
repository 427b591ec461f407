//! Router assembly and server bootstrap.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use parley_config::ServerConfig;
use parley_engine::ChatEngine;

use crate::rate_limit::RateLimiter;
use crate::routes;

/// Shared application state for API handlers.
pub struct AppState {
    pub engine: ChatEngine,
    pub limiter: RateLimiter,
}

/// Build the router: the API surface, permissive CORS, and an optional
/// static frontend at the root path.
pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/api/chat", post(routes::chat))
        .route("/api/reset", post(routes::reset))
        .route("/api/models", get(routes::models))
        .route("/api/health", get(routes::health))
        .with_state(state)
        .layer(CorsLayer::permissive());

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    app
}

/// Bind and serve until the process exits.
pub async fn serve(config: &ServerConfig, engine: ChatEngine) -> Result<()> {
    let state = Arc::new(AppState {
        engine,
        limiter: RateLimiter::new(&config.rate_limit),
    });
    let app = build_router(state, config.static_dir.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind, config.port))?;

    info!(%addr, "Parley gateway listening");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("gateway server terminated")?;
    Ok(())
}
