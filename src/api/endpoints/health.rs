//! GET /api/health — service liveness and Ollama reachability.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ollama_reachable: bool,
    pub version: &'static str,
}

pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let pipeline = ctx.pipeline.clone();
    let ollama_reachable = tokio::task::spawn_blocking(move || pipeline.health_check())
        .await
        .map_err(|e| ApiError::Internal(format!("health probe task failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok",
        ollama_reachable,
        version: config::APP_VERSION,
    }))
}
