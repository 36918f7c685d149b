//! Best-effort extraction of a UI description from raw model output.
//!
//! Small local models routinely wrap JSON in prose or markdown fences,
//! zero-pad numeric literals, and leave trailing commas. This module
//! tolerates all of that: ordered candidate extraction, two textual
//! repairs, structural parse, then validation. It never panics on
//! malformed input — the result is either a validated [`UiDescription`]
//! or the most specific [`ParseError`] encountered.

use regex::Regex;

use super::types::UiDescription;
use super::validate;

/// Non-fatal parse/validation failure. Consumed by the caller and
/// surfaced in the response envelope, never raised as a hard error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonFound,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    #[error("no valid sections after filtering")]
    NoValidSections,
}

impl ParseError {
    /// Ranking for "most specific error wins" reporting. A structure
    /// complaint about real JSON beats a syntax error, which beats
    /// finding no JSON at all.
    fn specificity(&self) -> u8 {
        match self {
            Self::NoJsonFound => 0,
            Self::InvalidJson(_) => 1,
            Self::InvalidStructure(_) => 2,
            Self::NoValidSections => 3,
        }
    }
}

/// Parse raw model output into a validated UI description.
///
/// Candidate `{...}` spans are tried longest-first: the longer span is
/// more likely to be the complete structure, shorter spans are nested
/// fragments to fall back on.
pub fn parse_ui_response(raw: &str) -> Result<UiDescription, ParseError> {
    let stripped = strip_code_fences(raw);

    let mut candidates = extract_object_spans(&stripped);
    if candidates.is_empty() {
        return Err(ParseError::NoJsonFound);
    }
    candidates.sort_by_key(|span| std::cmp::Reverse(span.len()));

    let mut best_error: Option<ParseError> = None;
    for candidate in candidates {
        match parse_candidate(candidate) {
            Ok(value) => match validate::validate_description(&value) {
                Ok(description) => return Ok(description),
                Err(err) => keep_most_specific(&mut best_error, err),
            },
            Err(err) => keep_most_specific(&mut best_error, err),
        }
    }

    Err(best_error.unwrap_or(ParseError::NoJsonFound))
}

/// Structurally parse one candidate span. The strict parse runs first:
/// well-formed JSON must pass through byte-for-byte untouched, so the
/// textual repairs only ever see candidates that already failed it.
fn parse_candidate(text: &str) -> Result<serde_json::Value, ParseError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    let repaired = remove_trailing_commas(&collapse_leading_zeros(text));
    serde_json::from_str(&repaired).map_err(|err| ParseError::InvalidJson(err.to_string()))
}

fn keep_most_specific(slot: &mut Option<ParseError>, err: ParseError) {
    let replace = match slot {
        Some(current) => err.specificity() > current.specificity(),
        None => true,
    };
    if replace {
        *slot = Some(err);
    }
}

/// Remove markdown code-fence delimiters. The fence language tag must
/// go too, or it would glue onto the JSON that follows.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Collect every balanced `{...}` span, string-literal aware so braces
/// inside quoted values do not break the depth count. Nested objects
/// yield their own candidate spans.
fn extract_object_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(i),
            b'}' => {
                if let Some(start) = stack.pop() {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    spans
}

/// Collapse zero-padded numeric literals (`0098` → `98`): a known
/// small-model formatting bug that breaks strict JSON parsers. The match
/// must not be preceded by a digit or a decimal point, or fractional
/// literals like `0.05` would lose their zeros.
fn collapse_leading_zeros(text: &str) -> String {
    let padded = Regex::new(r"(^|[^\d.])0+(\d)").expect("static regex");
    padded.replace_all(text, "${1}${2}").into_owned()
}

/// Drop trailing commas before a closing brace or bracket.
fn remove_trailing_commas(text: &str) -> String {
    let trailing = Regex::new(r",\s*([}\]])").expect("static regex");
    trailing.replace_all(text, "$1").into_owned()
}
