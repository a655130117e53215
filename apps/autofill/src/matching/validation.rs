//! Validation and repair of raw matcher output.
//!
//! The collaborator is a free-text generator, so nothing about its reply is
//! trusted: the text must parse to one JSON array, and only entries with a
//! non-empty `selector` and a truthy `value` survive.

use serde_json::Value;

use crate::llm_client::strip_json_fences;
use crate::matching::MatchError;
use crate::models::fill::FillAssignment;

/// Turns a raw completion into assignments.
///
/// Selectors are not checked against the extracted fields and duplicates are
/// kept in order; both are settled when the assignments are applied.
pub fn validate_assignments(raw: &str) -> Result<Vec<FillAssignment>, MatchError> {
    let value: Value = serde_json::from_str(array_span(raw))?;
    let Value::Array(entries) = value else {
        return Err(MatchError::NotAnArray);
    };

    let assignments: Vec<FillAssignment> = entries.iter().filter_map(to_assignment).collect();
    if assignments.is_empty() {
        return Err(MatchError::Empty);
    }
    Ok(assignments)
}

/// Strips code fences and, when the reply is wrapped in prose, narrows it to
/// the outermost `[ ... ]`.
fn array_span(raw: &str) -> &str {
    let text = strip_json_fences(raw);
    if text.starts_with('[') {
        return text;
    }
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn to_assignment(entry: &Value) -> Option<FillAssignment> {
    let object = entry.as_object()?;
    let selector = truthy_text(object.get("selector")?)?;
    let value = truthy_text(object.get("value")?)?;
    Some(FillAssignment { selector, value })
}

/// Stringifies a truthy scalar. `null`, `false`, `0`, blank strings, arrays and
/// objects yield `None`.
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
