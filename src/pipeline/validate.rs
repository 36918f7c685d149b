//! Structural contract enforcement for parsed model output.
//!
//! A parsed JSON value is only trusted once it passes these checks:
//! numeric top-level confidence, string layout, and at least one
//! section whose title/intent/ui fields are strings with a `ui` tag
//! inside the fixed primitive set. Failing sections are filtered out
//! silently; a response with zero surviving sections is rejected.

use serde_json::Value;

use super::parser::ParseError;
use super::types::{Layout, UiDescription, UiPrimitive, UiSection};

/// Validate a parsed top-level value into a [`UiDescription`].
pub fn validate_description(value: &Value) -> Result<UiDescription, ParseError> {
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::InvalidStructure("top-level value is not an object".into()))?;

    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| ParseError::InvalidStructure("missing numeric 'confidence'".into()))?;

    let layout = object
        .get("layout")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::InvalidStructure("missing string 'layout'".into()))?;

    let raw_sections = object
        .get("sections")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::InvalidStructure("missing 'sections' array".into()))?;

    let sections: Vec<UiSection> = raw_sections.iter().filter_map(validate_section).collect();
    if sections.is_empty() {
        return Err(ParseError::NoValidSections);
    }

    Ok(UiDescription {
        confidence: confidence.clamp(0.0, 1.0),
        layout: Layout::parse(layout),
        sections,
    })
}

/// Validate one candidate section. `None` means the section is dropped,
/// not corrected — the rest of the response is unaffected.
fn validate_section(value: &Value) -> Option<UiSection> {
    let object = value.as_object()?;

    let title = object.get("title")?.as_str()?;
    let intent = object.get("intent")?.as_str()?;
    let primitive = UiPrimitive::parse(object.get("ui")?.as_str()?)?;

    let content = object
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string);
    let data = object.get("data").filter(|v| !v.is_null()).cloned();
    let actions = object.get("actions").and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    });
    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    Some(UiSection {
        title: title.to_string(),
        intent: intent.to_string(),
        primitive,
        content,
        data,
        actions,
        confidence,
    })
}
