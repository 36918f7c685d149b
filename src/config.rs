use std::net::SocketAddr;

/// Application-level constants
pub const APP_NAME: &str = "limn";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ═══════════════════════════════════════════════════════════
// Inference limits — fixed deployment constants, not
// runtime-negotiated
// ═══════════════════════════════════════════════════════════

/// Hard ceiling on request input size. Inputs larger than this are
/// rejected before any prompt is built or any external call is made.
pub const MAX_INPUT_BYTES: usize = 200 * 1024;

/// Context window requested from the model (`num_ctx`).
pub const MAX_CONTEXT_TOKENS: u32 = 4096;

/// Output token cap requested from the model (`num_predict`).
pub const MAX_OUTPUT_TOKENS: i32 = 1024;

/// Informational only: expected resident memory for the default model
/// plus its context window. Not enforced anywhere.
pub const MEMORY_BUDGET_MB: u64 = 8192;

/// Hard timeout for a single generation request.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Timeout for a one-off model install (`/api/pull`). Model downloads
/// are multi-GB, so this is much longer than the request timeout.
pub const MODEL_INSTALL_TIMEOUT_SECS: u64 = 900;

/// Sampling temperature. Low, for reproducible structure extraction.
pub const TEMPERATURE: f32 = 0.1;

/// Model used when the request names none.
pub const DEFAULT_MODEL: &str = "llama3.2:3b";

/// Result-cache capacity. `None` = unbounded (entries live for the
/// process lifetime), `Some(n)` = LRU-bounded at `n` entries.
pub const CACHE_CAPACITY: Option<usize> = None;

// ═══════════════════════════════════════════════════════════
// Endpoints
// ═══════════════════════════════════════════════════════════

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Ollama base URL, overridable via `LIMN_OLLAMA_URL`.
pub fn ollama_url() -> String {
    std::env::var("LIMN_OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string())
}

/// HTTP bind address, overridable via `LIMN_BIND`.
/// Falls back to the default on unparseable values.
pub fn bind_addr() -> SocketAddr {
    let configured = std::env::var("LIMN_BIND").ok();
    if let Some(raw) = &configured {
        match raw.parse() {
            Ok(addr) => return addr,
            Err(_) => tracing::warn!(raw, "unparseable LIMN_BIND, using default"),
        }
    }
    DEFAULT_BIND.parse().expect("static default bind address")
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "limn=info,tower_http=warn"
}
