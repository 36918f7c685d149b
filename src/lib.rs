pub mod api;
pub mod cache;
pub mod config;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pipeline::ollama::OllamaClient;
use pipeline::types::GenerationOptions;
use pipeline::InferencePipeline;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("limn starting v{}", config::APP_VERSION);

    let client = OllamaClient::from_env();
    tracing::info!(
        ollama_url = client.base_url(),
        default_model = config::DEFAULT_MODEL,
        "inference backend configured"
    );

    let pipeline = Arc::new(InferencePipeline::new(
        Box::new(client),
        config::CACHE_CAPACITY,
        GenerationOptions::default(),
    ));

    // The pipeline is blocking (reqwest::blocking must not live inside an
    // async context), so the runtime is built explicitly here and handlers
    // reach the pipeline through spawn_blocking.
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(api::server::serve(config::bind_addr(), pipeline))?;
    Ok(())
}
