//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`. CORS is fully permissive since the
//! rendering client runs in a browser against this localhost service.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::pipeline::InferencePipeline;

pub fn api_router(pipeline: Arc<InferencePipeline>) -> Router {
    let ctx = ApiContext::new(pipeline);

    let routes = Router::new()
        .route("/generate", post(endpoints::generate::handle))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new().nest("/api", routes).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
