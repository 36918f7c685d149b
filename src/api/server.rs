//! TCP bind + serve.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::router::api_router;
use crate::pipeline::InferencePipeline;

pub async fn serve(addr: SocketAddr, pipeline: Arc<InferencePipeline>) -> std::io::Result<()> {
    let app = api_router(pipeline);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API listening");
    axum::serve(listener, app).await
}
