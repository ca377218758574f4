//! Error types for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use addipi_scheduler::StoreError;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum WebError {
    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "request failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ok": false, "error": self.to_string() })),
        )
            .into_response()
    }
}
