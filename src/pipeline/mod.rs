//! Inference pipeline: prompt construction, model invocation, response
//! extraction, structural validation, and result caching.
//!
//! Flow for one request:
//! Input guard → cache lookup → prompt build → generate (with at most one
//! model-install-and-retry on "model missing") → parse + validate →
//! cache put on success.
//!
//! Parse failures are data, not errors: the caller receives the raw model
//! output and the parse error so a client can fall back to plain-text
//! display. Only transport and provisioning failures surface as `Err`.

pub mod ollama;
pub mod parser;
pub mod prompt;
pub mod types;
pub mod validate;

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cache::{cache_key, params_fingerprint, ResultCache};
use crate::config;
use parser::ParseError;
use types::{GenerationOptions, LlmClient, UiDescription};

// ═══════════════════════════════════════════════════════════
// Error taxonomy
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input too large ({size} bytes, maximum {max})")]
    InputTooLarge { size: usize, max: usize },

    #[error("Ollama is not running at {0}")]
    Connection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("model '{0}' is not installed")]
    ModelMissing(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("model install failed: {0}")]
    Install(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("failed to decode Ollama response: {0}")]
    Decode(String),

    #[error("internal lock poisoned")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// Outcome
// ═══════════════════════════════════════════════════════════

/// Result of one pipeline run. Exactly one of `description` /
/// `parse_error` is populated; `raw_output` accompanies parse failures
/// so clients can render the text as-is.
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub description: Option<UiDescription>,
    pub raw_output: Option<String>,
    pub parse_error: Option<ParseError>,
    pub model: String,
    pub cached: bool,
    /// When the description was first produced. For cache hits this is
    /// the original creation time, not the time of the hit.
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════
// Orchestrator
// ═══════════════════════════════════════════════════════════

pub struct InferencePipeline {
    client: Box<dyn LlmClient>,
    cache: Mutex<ResultCache>,
    options: Mutex<GenerationOptions>,
}

impl InferencePipeline {
    pub fn new(
        client: Box<dyn LlmClient>,
        cache_capacity: Option<usize>,
        options: GenerationOptions,
    ) -> Self {
        let fingerprint = params_fingerprint(&options);
        Self {
            client,
            cache: Mutex::new(ResultCache::new(cache_capacity, fingerprint)),
            options: Mutex::new(options),
        }
    }

    /// Run the full pipeline for one input. `model` of `None` selects the
    /// deployment default.
    pub fn infer(
        &self,
        input: &str,
        model: Option<&str>,
    ) -> Result<InferenceOutcome, PipelineError> {
        if input.len() > config::MAX_INPUT_BYTES {
            return Err(PipelineError::InputTooLarge {
                size: input.len(),
                max: config::MAX_INPUT_BYTES,
            });
        }

        let input = input.trim();
        let model = model.unwrap_or(config::DEFAULT_MODEL);
        let key = cache_key(input, model);

        {
            let mut cache = self.cache.lock().map_err(|_| PipelineError::LockPoisoned)?;
            if let Some(description) = cache.get(&key) {
                tracing::debug!(model, "cache hit");
                let created_at = cache.created_at(&key).unwrap_or_else(Utc::now);
                return Ok(InferenceOutcome {
                    description: Some(description),
                    raw_output: None,
                    parse_error: None,
                    model: model.to_string(),
                    cached: true,
                    created_at,
                });
            }
        }

        let prompt = prompt::build_ui_prompt(input);
        let options = self
            .options
            .lock()
            .map_err(|_| PipelineError::LockPoisoned)?
            .clone();
        let raw = self.generate_with_install(model, &prompt, &options)?;

        match parser::parse_ui_response(&raw) {
            Ok(description) => {
                let mut cache = self.cache.lock().map_err(|_| PipelineError::LockPoisoned)?;
                cache.put(key.clone(), description.clone());
                let created_at = cache.created_at(&key).unwrap_or_else(Utc::now);
                Ok(InferenceOutcome {
                    description: Some(description),
                    raw_output: None,
                    parse_error: None,
                    model: model.to_string(),
                    cached: false,
                    created_at,
                })
            }
            Err(parse_error) => {
                tracing::warn!(model, %parse_error, "model output failed extraction");
                Ok(InferenceOutcome {
                    description: None,
                    raw_output: Some(raw),
                    parse_error: Some(parse_error),
                    model: model.to_string(),
                    cached: false,
                    created_at: Utc::now(),
                })
            }
        }
    }

    /// Generate, provisioning the model and retrying exactly once if the
    /// server reports it absent.
    fn generate_with_install(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PipelineError> {
        match self.client.generate(model, prompt, options) {
            Err(PipelineError::ModelMissing(_)) => {
                tracing::info!(model, "model not installed, pulling");
                self.client.install_model(model)?;
                self.client.generate(model, prompt, options)
            }
            other => other,
        }
    }

    /// Replace the generation parameters. A changed parameter set clears
    /// the cache wholesale via its fingerprint.
    pub fn set_options(&self, options: GenerationOptions) -> Result<(), PipelineError> {
        let fingerprint = params_fingerprint(&options);
        *self
            .options
            .lock()
            .map_err(|_| PipelineError::LockPoisoned)? = options;
        self.cache
            .lock()
            .map_err(|_| PipelineError::LockPoisoned)?
            .set_params_fingerprint(fingerprint);
        Ok(())
    }

    pub fn health_check(&self) -> bool {
        self.client.health_check()
    }

    #[cfg(test)]
    fn cache_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::ollama::MockLlmClient;
    use super::*;

    const VALID_RESPONSE: &str = r#"```json
{
  "confidence": 0.9,
  "layout": "vertical",
  "sections": [
    {"title": "Summary", "intent": "summary", "ui": "card",
     "content": "All good.", "confidence": 0.85}
  ]
}
```"#;

    fn pipeline_with(client: MockLlmClient) -> InferencePipeline {
        InferencePipeline::new(Box::new(client), None, GenerationOptions::default())
    }

    #[test]
    fn successful_inference_parses_and_caches() {
        let client = MockLlmClient::new(VALID_RESPONSE);
        let log = client.log();
        let pipeline = pipeline_with(client);

        let first = pipeline.infer("show me a summary", None).unwrap();
        assert!(!first.cached);
        assert_eq!(first.description.as_ref().unwrap().sections.len(), 1);
        assert!(first.raw_output.is_none());

        let second = pipeline.infer("show me a summary", None).unwrap();
        assert!(second.cached);
        assert_eq!(second.description, first.description);
        assert_eq!(
            second.created_at, first.created_at,
            "hits report the original creation time"
        );
        assert_eq!(log.generate_count(), 1, "cache hit must not re-generate");
    }

    #[test]
    fn whitespace_variants_share_a_cache_entry() {
        let client = MockLlmClient::new(VALID_RESPONSE);
        let log = client.log();
        let pipeline = pipeline_with(client);

        pipeline.infer("hello world", None).unwrap();
        let hit = pipeline.infer("   hello world \n", None).unwrap();
        assert!(hit.cached);
        assert_eq!(log.generate_count(), 1);
    }

    #[test]
    fn different_model_is_a_separate_entry() {
        let client = MockLlmClient::new(VALID_RESPONSE);
        let log = client.log();
        let pipeline = pipeline_with(client);

        pipeline.infer("hello", None).unwrap();
        pipeline.infer("hello", Some("other:7b")).unwrap();
        assert_eq!(log.generate_count(), 2);
        assert_eq!(pipeline.cache_len(), 2);
    }

    #[test]
    fn parse_failure_returns_raw_output_and_is_not_cached() {
        let client = MockLlmClient::new("I cannot answer that in JSON form.");
        let log = client.log();
        let pipeline = pipeline_with(client);

        let outcome = pipeline.infer("hello", None).unwrap();
        assert!(outcome.description.is_none());
        assert_eq!(
            outcome.raw_output.as_deref(),
            Some("I cannot answer that in JSON form.")
        );
        assert!(matches!(outcome.parse_error, Some(ParseError::NoJsonFound)));
        assert!(!outcome.cached);

        pipeline.infer("hello", None).unwrap();
        assert_eq!(log.generate_count(), 2, "failures must not be cached");
    }

    #[test]
    fn missing_model_installs_once_and_retries_once() {
        let client = MockLlmClient::with_script(
            vec![
                Err(PipelineError::ModelMissing("llama3.2:3b".into())),
                Ok(VALID_RESPONSE.to_string()),
            ],
            VALID_RESPONSE,
        );
        let log = client.log();
        let pipeline = pipeline_with(client);

        let outcome = pipeline.infer("hello", None).unwrap();
        assert!(outcome.description.is_some());
        assert_eq!(log.install_count(), 1);
        assert_eq!(log.generate_count(), 2);
    }

    #[test]
    fn second_missing_model_error_surfaces() {
        let client = MockLlmClient::with_script(
            vec![
                Err(PipelineError::ModelMissing("llama3.2:3b".into())),
                Err(PipelineError::ModelMissing("llama3.2:3b".into())),
            ],
            VALID_RESPONSE,
        );
        let log = client.log();
        let pipeline = pipeline_with(client);

        let err = pipeline.infer("hello", None).unwrap_err();
        assert!(matches!(err, PipelineError::ModelMissing(_)));
        assert_eq!(log.install_count(), 1, "exactly one install attempt");
        assert_eq!(log.generate_count(), 2, "exactly one retry");
    }

    #[test]
    fn install_failure_surfaces_without_retry() {
        let client = MockLlmClient::with_script(
            vec![Err(PipelineError::ModelMissing("llama3.2:3b".into()))],
            VALID_RESPONSE,
        )
        .with_install_error(PipelineError::Install("pull failed".into()));
        let log = client.log();
        let pipeline = pipeline_with(client);

        let err = pipeline.infer("hello", None).unwrap_err();
        assert!(matches!(err, PipelineError::Install(_)));
        assert_eq!(log.generate_count(), 1);
    }

    #[test]
    fn oversized_input_rejected_before_any_client_call() {
        let client = MockLlmClient::unreachable();
        let log = client.log();
        let pipeline = pipeline_with(client);

        let oversized = "x".repeat(config::MAX_INPUT_BYTES + 1);
        let err = pipeline.infer(&oversized, None).unwrap_err();
        assert!(matches!(err, PipelineError::InputTooLarge { .. }));
        assert_eq!(log.generate_count(), 0);
    }

    #[test]
    fn connection_error_propagates() {
        let client = MockLlmClient::with_script(
            vec![Err(PipelineError::Connection(
                "http://localhost:11434".into(),
            ))],
            VALID_RESPONSE,
        );
        let pipeline = pipeline_with(client);

        let err = pipeline.infer("hello", None).unwrap_err();
        assert!(err.to_string().contains("not running"));
    }

    #[test]
    fn changing_options_clears_the_cache() {
        let client = MockLlmClient::new(VALID_RESPONSE);
        let log = client.log();
        let pipeline = pipeline_with(client);

        pipeline.infer("hello", None).unwrap();
        assert_eq!(pipeline.cache_len(), 1);

        let hotter = GenerationOptions {
            temperature: 0.9,
            ..GenerationOptions::default()
        };
        pipeline.set_options(hotter).unwrap();
        assert_eq!(pipeline.cache_len(), 0);

        pipeline.infer("hello", None).unwrap();
        assert_eq!(log.generate_count(), 2, "entry recomputed after invalidation");
    }

    #[test]
    fn error_messages_name_their_subject() {
        let err = PipelineError::InputTooLarge { size: 300_000, max: 204_800 };
        assert_eq!(err.to_string(), "input too large (300000 bytes, maximum 204800)");
        assert_eq!(
            PipelineError::ModelMissing("llama3.2:3b".into()).to_string(),
            "model 'llama3.2:3b' is not installed"
        );
        assert_eq!(
            PipelineError::Timeout(120).to_string(),
            "request timed out after 120s"
        );
    }
}
