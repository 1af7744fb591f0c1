//! Route handlers.
//!
//! - `GET /api/feed` - merged RSS 2.0 feed, rebuilt on every request
//! - `GET /health` - health check (JSON)

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::error::ApiError;
use super::state::AppState;
use crate::feed::{aggregate, serialize};

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/feed", get(feed_handler))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Fetches every source, merges and serializes.
///
/// Upstream failures never fail the request; a failing source just
/// contributes nothing.
async fn feed_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let items = aggregate(
        &state.http,
        &state.sources,
        state.fetch,
        state.extractor.clone(),
    )
    .await;

    let xml = serialize(&items, &state.channel)?;
    Ok(([(CONTENT_TYPE, RSS_CONTENT_TYPE)], xml).into_response())
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
