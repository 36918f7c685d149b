//! Ollama HTTP client.
//!
//! Thin blocking wrapper over the Ollama REST API. No parsing of model
//! output happens here; this module only moves prompts out and raw text
//! back, mapping transport and status failures onto [`PipelineError`].
//!
//! Two timeouts: a hard per-request timeout for generation, and a much
//! longer one for `/api/pull` since a cold model download can run for
//! many minutes.

use serde::{Deserialize, Serialize};

use super::types::{GenerationOptions, LlmClient};
use super::PipelineError;
use crate::config;

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

impl From<&GenerationOptions> for OllamaOptions {
    fn from(options: &GenerationOptions) -> Self {
        Self {
            temperature: options.temperature,
            num_ctx: options.num_ctx,
            num_predict: options.num_predict,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct OllamaPullRequest<'a> {
    name: &'a str,
    stream: bool,
}

// ═══════════════════════════════════════════════════════════
// Client
// ═══════════════════════════════════════════════════════════

pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    install_client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64, install_timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        let install_client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(install_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            install_client,
            timeout_secs,
        }
    }

    pub fn default_local() -> Self {
        Self::new(
            config::DEFAULT_OLLAMA_URL,
            config::REQUEST_TIMEOUT_SECS,
            config::MODEL_INSTALL_TIMEOUT_SECS,
        )
    }

    /// Construct from `LIMN_OLLAMA_URL`, falling back to the default
    /// local endpoint.
    pub fn from_env() -> Self {
        Self::new(
            &config::ollama_url(),
            config::REQUEST_TIMEOUT_SECS,
            config::MODEL_INSTALL_TIMEOUT_SECS,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_transport_error(&self, err: reqwest::Error) -> PipelineError {
        if err.is_connect() {
            PipelineError::Connection(self.base_url.clone())
        } else if err.is_timeout() {
            PipelineError::Timeout(self.timeout_secs)
        } else {
            PipelineError::HttpClient(err.to_string())
        }
    }
}

impl LlmClient for OllamaClient {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PipelineError> {
        let request = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
            options: OllamaOptions::from(options),
        };

        tracing::debug!(model, prompt_bytes = prompt.len(), "sending generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            // Ollama answers 404 with a "model ... not found" body when the
            // requested model is absent. Surface that distinctly so the
            // pipeline can provision and retry.
            if status.as_u16() == 404 && body.contains("not found") {
                return Err(PipelineError::ModelMissing(model.to_string()));
            }
            return Err(PipelineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: OllamaGenerateResponse = response
            .json()
            .map_err(|e| PipelineError::Decode(e.to_string()))?;
        Ok(payload.response)
    }

    fn install_model(&self, model: &str) -> Result<(), PipelineError> {
        tracing::info!(model, "pulling model from Ollama registry");

        let response = self
            .install_client
            .post(format!("{}/api/pull", self.base_url))
            .json(&OllamaPullRequest {
                name: model,
                stream: false,
            })
            .send()
            .map_err(|e| PipelineError::Install(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PipelineError::Install(format!(
                "pull returned status {status}: {body}"
            )));
        }

        tracing::info!(model, "model pull complete");
        Ok(())
    }

    fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }
}

// ═══════════════════════════════════════════════════════════
// Mock client
// ═══════════════════════════════════════════════════════════

/// Call log shared between a [`MockLlmClient`] and the test that owns it.
#[derive(Clone, Default)]
pub struct MockCallLog {
    generate: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    install: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl MockCallLog {
    pub fn generate_count(&self) -> usize {
        self.generate.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    pub fn install_count(&self) -> usize {
        self.install.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

/// Scripted stand-in for a live Ollama instance.
///
/// Responses are consumed from `script` in order; once the script is
/// exhausted every call returns `default_response`. All generate and
/// install calls are recorded in the shared [`MockCallLog`] so tests can
/// assert retry counts.
pub struct MockLlmClient {
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, PipelineError>>>,
    default_response: String,
    install_error: std::sync::Mutex<Option<PipelineError>>,
    reachable: bool,
    log: MockCallLog,
}

impl MockLlmClient {
    /// A client that answers every generate call with `response`.
    pub fn new(response: &str) -> Self {
        Self::with_script(Vec::new(), response)
    }

    /// A client that plays `script` in order, then falls back to
    /// `default_response`.
    pub fn with_script(
        script: Vec<Result<String, PipelineError>>,
        default_response: &str,
    ) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            default_response: default_response.to_string(),
            install_error: std::sync::Mutex::new(None),
            reachable: true,
            log: MockCallLog::default(),
        }
    }

    /// Make the next install call fail with `error`.
    pub fn with_install_error(self, error: PipelineError) -> Self {
        if let Ok(mut slot) = self.install_error.lock() {
            *slot = Some(error);
        }
        self
    }

    /// A client that should never be called; health checks report down.
    pub fn unreachable() -> Self {
        let mut client = Self::new("");
        client.reachable = false;
        client
    }

    pub fn log(&self) -> MockCallLog {
        self.log.clone()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(
        &self,
        model: &str,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, PipelineError> {
        if let Ok(mut calls) = self.log.generate.lock() {
            calls.push(model.to_string());
        }
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match scripted {
            Some(result) => result,
            None => Ok(self.default_response.clone()),
        }
    }

    fn install_model(&self, model: &str) -> Result<(), PipelineError> {
        if let Ok(mut calls) = self.log.install.lock() {
            calls.push(model.to_string());
        }
        let error = self.install_error.lock().ok().and_then(|mut slot| slot.take());
        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn health_check(&self) -> bool {
        self.reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = OllamaClient::new("http://localhost:11434/", 5, 10);
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn default_local_targets_configured_endpoint() {
        let client = OllamaClient::default_local();
        assert_eq!(client.base_url(), config::DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn generate_request_serializes_options() {
        let options = GenerationOptions {
            temperature: 0.1,
            num_ctx: Some(4096),
            num_predict: None,
        };
        let request = OllamaGenerateRequest {
            model: "llama3.2:3b",
            prompt: "hello",
            stream: false,
            options: OllamaOptions::from(&options),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2:3b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.1f32 as f64);
        assert_eq!(json["options"]["num_ctx"], 4096);
        assert!(json["options"].get("num_predict").is_none(), "None options are omitted");
    }

    #[test]
    fn pull_request_shape() {
        let json = serde_json::to_value(OllamaPullRequest {
            name: "llama3.2:3b",
            stream: false,
        })
        .unwrap();
        assert_eq!(json["name"], "llama3.2:3b");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn mock_plays_script_then_default() {
        let mock = MockLlmClient::with_script(
            vec![Ok("first".to_string())],
            "fallback",
        );
        let opts = GenerationOptions::default();
        assert_eq!(mock.generate("m", "p", &opts).unwrap(), "first");
        assert_eq!(mock.generate("m", "p", &opts).unwrap(), "fallback");
        assert_eq!(mock.log().generate_count(), 2);
    }

    #[test]
    fn mock_records_install_calls() {
        let mock = MockLlmClient::new("ok");
        mock.install_model("m").unwrap();
        assert_eq!(mock.log().install_count(), 1);

        let failing = MockLlmClient::new("ok")
            .with_install_error(PipelineError::Install("nope".into()));
        assert!(failing.install_model("m").is_err());
        assert!(failing.install_model("m").is_ok(), "install error is one-shot");
    }

    #[test]
    fn unreachable_mock_reports_down() {
        assert!(!MockLlmClient::unreachable().health_check());
        assert!(MockLlmClient::new("ok").health_check());
    }
}
