use serde::{Deserialize, Serialize};

use super::PipelineError;
use crate::config;

// ═══════════════════════════════════════════════════════════
// UI vocabulary
// ═══════════════════════════════════════════════════════════

/// The fixed set of renderable section kinds.
///
/// Sections whose `ui` tag is not in this set are dropped by the
/// validator, never corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiPrimitive {
    Text,
    Card,
    Table,
    Chart,
    List,
    Metric,
}

impl UiPrimitive {
    /// The primitive vocabulary, as advertised in the prompt contract.
    pub const VOCABULARY: &'static [&'static str] =
        &["text", "card", "table", "chart", "list", "metric"];

    /// Parse a `ui` tag. Returns `None` for anything outside the set.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(Self::Text),
            "card" => Some(Self::Card),
            "table" => Some(Self::Table),
            "chart" => Some(Self::Chart),
            "list" => Some(Self::List),
            "metric" => Some(Self::Metric),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Card => "card",
            Self::Table => "table",
            Self::Chart => "chart",
            Self::List => "list",
            Self::Metric => "metric",
        }
    }
}

/// Overall arrangement of the rendered sections. A display hint, not
/// payload: unknown layout strings degrade to `Vertical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Vertical,
    Horizontal,
    Grid,
}

impl Layout {
    pub fn parse(value: &str) -> Self {
        match value {
            "horizontal" => Self::Horizontal,
            "grid" => Self::Grid,
            _ => Self::Vertical,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Validated inference result
// ═══════════════════════════════════════════════════════════

/// One renderable section of a UI description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSection {
    pub title: String,
    /// Purpose tag (summary, analysis, data, insight, action, ...).
    /// Free-form string, used only for display grouping.
    pub intent: String,
    #[serde(rename = "ui")]
    pub primitive: UiPrimitive,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    /// Self-reported certainty, clamped to [0.0, 1.0].
    pub confidence: f64,
}

/// Validated result of one inference: the only shape ever surfaced to
/// clients or stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiDescription {
    pub confidence: f64,
    pub layout: Layout,
    /// Ordered, non-empty after validation.
    pub sections: Vec<UiSection>,
}

// ═══════════════════════════════════════════════════════════
// Generation parameters
// ═══════════════════════════════════════════════════════════

/// Generation parameters for Ollama `/api/generate`.
///
/// Fixed per deployment; changing them invalidates the result cache
/// wholesale (the cache fingerprints the serialized form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature (0.0-1.0). Lower = more deterministic.
    pub temperature: f32,
    /// Context window size. None = model default.
    pub num_ctx: Option<u32>,
    /// Maximum tokens in the generated response. None = model default.
    pub num_predict: Option<i32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: config::TEMPERATURE,
            num_ctx: Some(config::MAX_CONTEXT_TOKENS),
            num_predict: Some(config::MAX_OUTPUT_TOKENS),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Client seam
// ═══════════════════════════════════════════════════════════

/// Abstraction over the generation backend, so the pipeline can be
/// exercised against a mock instead of a live Ollama instance.
pub trait LlmClient: Send + Sync {
    /// One synchronous request/response generation exchange.
    /// No parsing performed here; returns the raw text payload.
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PipelineError>;

    /// Provision a model that the server reported as absent.
    fn install_model(&self, model: &str) -> Result<(), PipelineError>;

    /// Lightweight reachability probe. Never errors.
    fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_parse_accepts_vocabulary() {
        for tag in UiPrimitive::VOCABULARY {
            let parsed = UiPrimitive::parse(tag).unwrap();
            assert_eq!(parsed.as_str(), *tag);
        }
    }

    #[test]
    fn primitive_parse_rejects_unknown() {
        assert!(UiPrimitive::parse("carousel").is_none());
        assert!(UiPrimitive::parse("").is_none());
        assert!(UiPrimitive::parse("Card").is_none(), "tags are case-sensitive");
    }

    #[test]
    fn primitive_serializes_lowercase() {
        let json = serde_json::to_string(&UiPrimitive::Card).unwrap();
        assert_eq!(json, "\"card\"");
    }

    #[test]
    fn layout_parse_falls_back_to_vertical() {
        assert_eq!(Layout::parse("grid"), Layout::Grid);
        assert_eq!(Layout::parse("horizontal"), Layout::Horizontal);
        assert_eq!(Layout::parse("vertical"), Layout::Vertical);
        assert_eq!(Layout::parse("diagonal"), Layout::Vertical);
    }

    #[test]
    fn section_serializes_primitive_as_ui() {
        let section = UiSection {
            title: "T".into(),
            intent: "summary".into(),
            primitive: UiPrimitive::Card,
            content: None,
            data: None,
            actions: None,
            confidence: 0.8,
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["ui"], "card");
        assert!(json.get("content").is_none(), "absent optionals are omitted");
    }

    #[test]
    fn generation_options_default_matches_config() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - crate::config::TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(opts.num_ctx, Some(crate::config::MAX_CONTEXT_TOKENS));
        assert_eq!(opts.num_predict, Some(crate::config::MAX_OUTPUT_TOKENS));
    }
}
