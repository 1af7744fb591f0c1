//! HTTP endpoint serving the merged feed.
//!
//! Stateless apart from the read-only [`AppState`]; every request refetches
//! all sources.

mod error;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Request};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::config::{Config, ServerConfig};

pub use error::{ApiError, INTERNAL_ERROR_BODY};
pub use routes::{router, HealthResponse, RSS_CONTENT_TYPE};
pub use state::AppState;

/// Builds the router with tracing and CORS middleware.
pub fn app(config: &Config) -> Result<Router> {
    let state = AppState::new(config)?;
    with_middleware(router(state), &config.server)
}

/// Wraps `router` in request tracing and the configured CORS policy.
pub fn with_middleware(router: Router, server: &ServerConfig) -> Result<Router> {
    Ok(router
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(cors_layer(server.allowed_origin())?))
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin {
        None => Ok(layer.allow_origin(Any)),
        Some(origin) => {
            let value = HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin: {origin}"))?;
            Ok(layer.allow_origin(value))
        }
    }
}

/// Binds to `server.host:server.port` and serves until SIGINT/SIGTERM.
pub async fn serve(config: Config) -> Result<()> {
    let app = app(&config)?;
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "starting feed server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("feed server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down gracefully"),
            _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT, shutting down gracefully"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received Ctrl-C, shutting down gracefully");
    }
}
