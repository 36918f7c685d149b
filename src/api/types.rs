//! Shared API state and wire envelopes.

use std::sync::Arc;

use serde::Serialize;

use crate::pipeline::types::UiDescription;
use crate::pipeline::InferencePipeline;

/// Shared context handed to all endpoint handlers via `State`.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<InferencePipeline>,
}

impl ApiContext {
    pub fn new(pipeline: Arc<InferencePipeline>) -> Self {
        Self { pipeline }
    }
}

/// Response envelope for `POST /api/generate`.
///
/// camelCase on the wire for the browser-side renderer. Absent optionals
/// are omitted rather than serialized as null, except `ui_description`
/// which is always present so clients can branch on it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub ui_description: Option<UiDescription>,
    pub raw_input: String,
    /// Milliseconds spent producing this response; 0 for cache hits.
    pub processing_time: u64,
    pub model_used: String,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
