//! POST /api/generate — one text-to-UI inference.
//!
//! The body is read as a raw JSON value so a non-string `input` becomes a
//! 400 with a descriptive message instead of axum's extractor 422. The
//! blocking pipeline runs on the blocking pool; concurrent requests for
//! different inputs proceed in parallel.

use std::time::Instant;

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, GenerateResponse};
use crate::config;
use crate::pipeline::PipelineError;

pub async fn handle(
    State(ctx): State<ApiContext>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("request body must be a JSON object".into()))?;

    let input = match object.get("input") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(_) => return Err(ApiError::BadRequest("'input' must be a string".into())),
        None => return Err(ApiError::BadRequest("missing required field 'input'".into())),
    };
    if input.trim().is_empty() {
        return Err(ApiError::BadRequest("'input' must not be empty".into()));
    }
    if input.len() > config::MAX_INPUT_BYTES {
        return Err(ApiError::BadRequest(format!(
            "input too large ({} bytes, maximum {})",
            input.len(),
            config::MAX_INPUT_BYTES
        )));
    }

    let model = match object.get("model") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ApiError::BadRequest("'model' must be a string".into())),
    };

    let started = Instant::now();
    let pipeline = ctx.pipeline.clone();
    let infer_input = input.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        pipeline.infer(&infer_input, model.as_deref())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("inference task failed: {e}")))?
    .map_err(|err| match err {
        PipelineError::InputTooLarge { size, max } => ApiError::BadRequest(format!(
            "input too large ({size} bytes, maximum {max})"
        )),
        other => ApiError::Inference(other),
    })?;

    let processing_time = if outcome.cached {
        0
    } else {
        started.elapsed().as_millis() as u64
    };

    tracing::info!(
        model = %outcome.model,
        cached = outcome.cached,
        parsed = outcome.description.is_some(),
        processing_time,
        "generate request complete"
    );

    Ok(Json(GenerateResponse {
        ui_description: outcome.description,
        raw_input: input,
        processing_time,
        model_used: outcome.model,
        cached: outcome.cached,
        raw_output: outcome.raw_output,
        parse_error: outcome.parse_error.map(|e| e.to_string()),
        error: None,
    }))
}
