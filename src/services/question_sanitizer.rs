use serde_json::Value as JsonValue;

use crate::models::question::{Question, OPTION_COUNT};
use crate::services::answer_resolver;

const OPTION_KEYS: [&str; 2] = ["options", "choices"];
const ANSWER_KEYS: [&str; 2] = ["answer_index", "answer"];
const EXPLANATION_KEYS: [&str; 2] = ["explanation", "rationale"];

/// Normalizes one raw question record into the canonical 4-option shape.
/// Never fails: missing or garbage fields become empty strings or index 0.
pub fn sanitize(item: &JsonValue) -> Question {
    let question = item
        .get("question")
        .map(value_text)
        .unwrap_or_default()
        .trim()
        .to_string();

    let options = pad_options(raw_options(item));
    let explanation = first_present(item, &EXPLANATION_KEYS)
        .map(value_text)
        .unwrap_or_default()
        .trim()
        .to_string();
    let answer = first_present(item, &ANSWER_KEYS).unwrap_or(&JsonValue::Null);
    let answer_index = answer_resolver::resolve(answer, &options, Some(explanation.as_str()));

    Question {
        question,
        options,
        answer_index,
        explanation,
    }
}

/// First key whose value is present and not null.
fn first_present<'a>(item: &'a JsonValue, keys: &[&str]) -> Option<&'a JsonValue> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find(|value| !value.is_null())
}

/// First non-empty option list. Objects such as `{"A": "...", "B": "..."}`
/// contribute their values in key order.
fn raw_options(item: &JsonValue) -> Vec<String> {
    OPTION_KEYS
        .iter()
        .filter_map(|key| item.get(*key))
        .map(|value| match value {
            JsonValue::Array(list) => list.iter().map(value_text).collect::<Vec<_>>(),
            JsonValue::Object(map) => map.values().map(value_text).collect(),
            _ => Vec::new(),
        })
        .find(|list| !list.is_empty())
        .unwrap_or_default()
}

fn pad_options(raw: Vec<String>) -> [String; OPTION_COUNT] {
    let mut iter = raw.into_iter().map(|o| o.trim().to_string());
    std::array::from_fn(|_| iter.next().unwrap_or_default())
}

fn value_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
