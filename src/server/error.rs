//! Error type for the HTTP endpoint.
//!
//! Clients only ever see a generic plain-text message. The cause goes to
//! the log.

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Body returned with every 500.
pub const INTERNAL_ERROR_BODY: &str = "Error generating feed";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Building the merged feed failed (serialization, task failure).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Internal(err) => {
                tracing::error!(error = %format!("{err:#}"), "Failed to generate feed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                    INTERNAL_ERROR_BODY,
                )
                    .into_response()
            }
        }
    }
}
