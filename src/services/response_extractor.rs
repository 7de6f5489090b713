//! Pulls the JSON payload out of a model reply that may be wrapped in code
//! fences or surrounded by prose.

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Keys a model may use for the question list, in priority order.
pub const ITEM_KEYS: [&str; 3] = ["quiz", "questions", "items"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("model reply was empty")]
    Empty,

    #[error("no JSON object found in model reply")]
    NoJson,

    #[error("JSON parse error: {0}")]
    Parse(String),
}

pub fn extract(raw: &str) -> Result<JsonValue, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::Empty);
    }
    let body = strip_code_fence(trimmed);

    let direct_err = match serde_json::from_str::<JsonValue>(body) {
        Ok(value) if value.is_object() || value.is_array() => return Ok(value),
        Ok(_) => ExtractionError::NoJson,
        Err(e) => ExtractionError::Parse(e.to_string()),
    };

    match brace_span(body) {
        Some(span) => serde_json::from_str::<JsonValue>(span)
            .map_err(|e| ExtractionError::Parse(e.to_string())),
        None => Err(direct_err),
    }
}

/// Interior of the first ```json fence, else of the first bare fence. Text
/// without a closing fence is returned unchanged.
fn strip_code_fence(text: &str) -> &str {
    if !text.contains("```") {
        return text;
    }
    let start = match find_ascii_case_insensitive(text, "```json") {
        Some(pos) => pos + "```json".len(),
        None => match text.find("```") {
            Some(pos) => pos + 3,
            None => return text,
        },
    };
    match text[start..].find("```") {
        Some(len) => text[start..start + len].trim(),
        None => text,
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// First `{` through last `}`, inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// The question list from a parsed reply: the first non-empty array under
/// one of [`ITEM_KEYS`], or the value itself when the model returned a bare
/// array. Anything else yields an empty list.
pub fn quiz_items(value: &JsonValue) -> Vec<JsonValue> {
    if let Some(items) = value.as_array() {
        return items.clone();
    }
    ITEM_KEYS
        .iter()
        .filter_map(|key| value.get(*key).and_then(JsonValue::as_array))
        .find(|items| !items.is_empty())
        .cloned()
        .unwrap_or_default()
}

/// Extraction plus item lookup; parse failures become an empty list.
pub fn extract_items(raw: &str) -> Vec<JsonValue> {
    match extract(raw) {
        Ok(value) => quiz_items(&value),
        Err(e) => {
            tracing::warn!(error = %e, "could not parse quiz JSON from model reply");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_plain_json() {
        let value = extract(r#"{"quiz": []}"#).unwrap();
        assert_eq!(value, json!({"quiz": []}));
    }

    #[test]
    fn extracts_json_fenced_block() {
        let raw = "```json\n{\"quiz\":[{\"question\":\"Q1\"}]}\n```";
        let value = extract(raw).unwrap();
        assert_eq!(value["quiz"][0]["question"], "Q1");
    }

    #[test]
    fn prefers_json_fence_over_earlier_bare_fence() {
        let raw = "Here:\n```\nnot json\n```\nand\n```JSON\n{\"items\": [1]}\n```";
        let value = extract(raw).unwrap();
        assert_eq!(value, json!({"items": [1]}));
    }

    #[test]
    fn extracts_unlabelled_fence() {
        let raw = "```\n{\"questions\": [{\"question\": \"Q\"}]}\n```";
        let value = extract(raw).unwrap();
        assert_eq!(value["questions"][0]["question"], "Q");
    }

    #[test]
    fn recovers_object_from_surrounding_prose() {
        let raw = "Sure! Here is your quiz: {\"quiz\": [{\"question\": \"Q\"}]} Let me know if you need more.";
        let value = extract(raw).unwrap();
        assert_eq!(value["quiz"][0]["question"], "Q");
    }

    #[test]
    fn recovers_object_inside_language_tagged_fence() {
        let raw = "```python\n{\"quiz\": []}\n```";
        assert_eq!(extract(raw).unwrap(), json!({"quiz": []}));
    }

    #[test]
    fn reports_failures_instead_of_panicking() {
        assert_eq!(extract("   "), Err(ExtractionError::Empty));
        assert!(matches!(extract("no braces here"), Err(ExtractionError::Parse(_))));
        assert!(matches!(extract("{ broken: json }"), Err(ExtractionError::Parse(_))));
        assert_eq!(extract("42"), Err(ExtractionError::NoJson));
        assert!(matches!(extract("} backwards {"), Err(ExtractionError::Parse(_))));
    }

    #[test]
    fn item_keys_are_tried_in_order() {
        let value = json!({"questions": [{"question": "b"}], "quiz": [{"question": "a"}]});
        assert_eq!(quiz_items(&value)[0]["question"], "a");

        let value = json!({"quiz": [], "items": [{"question": "c"}]});
        assert_eq!(quiz_items(&value)[0]["question"], "c");

        assert!(quiz_items(&json!({"data": [1, 2]})).is_empty());
        assert_eq!(quiz_items(&json!([{"question": "d"}])).len(), 1);
    }

    #[test]
    fn extract_items_swallows_parse_errors() {
        assert!(extract_items("the model refused").is_empty());
        assert_eq!(extract_items(r#"{"quiz":[{"question":"Q"}]}"#).len(), 1);
    }
}
