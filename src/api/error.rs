//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::pipeline::PipelineError;

/// API-level errors with HTTP status mapping.
///
/// Input validation failures map to 400 with a flat `{error}` body.
/// Everything else maps to 500 with the structured failure envelope
/// (`uiDescription: null`, `cached: false`, `error`) so a rendering
/// client can treat any response body uniformly.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Inference(PipelineError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": detail })),
            )
                .into_response(),
            ApiError::Inference(err) => {
                tracing::error!(error = %err, "inference failed");
                failure_envelope(err.to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                failure_envelope(detail)
            }
        }
    }
}

fn failure_envelope(error: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "uiDescription": null,
            "cached": false,
            "error": error,
        })),
    )
        .into_response()
}
