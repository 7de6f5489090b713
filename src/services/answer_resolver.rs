//! Maps whatever a model put in the "answer" slot onto a 0-based option index.
//!
//! Resolution is an ordered list of independent strategies; the first one
//! that produces an index wins. Every strategy is pure and total, and the
//! chain ends in a default of 0, so resolution can never fail.
//!
//! Numerals are read asymmetrically: a JSON integer is taken as already
//! 0-based and clamped, while a numeral inside text ("2", "Option 3") in the
//! range 1..=4 is taken as 1-based. Out-of-range text numerals are clamped
//! instead, which can misattribute answers such as "Option 0" or "5".

use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

use crate::models::question::OPTION_COUNT;
use crate::utils::text::normalize_tokens;

const LETTERS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];
const MAX_INDEX: i64 = OPTION_COUNT as i64 - 1;

/// Index plus the name of the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub index: usize,
    pub strategy: &'static str,
}

struct AnswerContext<'a> {
    raw: &'a JsonValue,
    text: String,
    options: &'a [String],
    explanation: Option<&'a str>,
}

type Strategy = fn(&AnswerContext<'_>) -> Option<usize>;

const STRATEGIES: [(&str, Strategy); 8] = [
    ("integer", integer_value),
    ("labelled_numeral", labelled_numeral),
    ("bare_numeral", bare_numeral),
    ("labelled_letter", labelled_letter),
    ("bare_letter", bare_letter),
    ("option_text", option_text),
    ("explanation_mention", explanation_mention),
    ("default", first_option),
];

pub fn resolve(raw: &JsonValue, options: &[String], explanation: Option<&str>) -> usize {
    resolve_with_strategy(raw, options, explanation).index
}

pub fn resolve_with_strategy(
    raw: &JsonValue,
    options: &[String],
    explanation: Option<&str>,
) -> Resolution {
    let explanation = explanation.filter(|e| !e.is_empty());
    let mut text = answer_text(raw);
    if text.is_empty() {
        if let Some(exp) = explanation {
            text = exp.to_string();
        }
    }

    let ctx = AnswerContext {
        raw,
        text,
        options: &options[..options.len().min(OPTION_COUNT)],
        explanation,
    };

    STRATEGIES
        .iter()
        .find_map(|&(name, strategy)| {
            strategy(&ctx).map(|index| {
                tracing::trace!(strategy = name, index, "answer resolved");
                Resolution {
                    index,
                    strategy: name,
                }
            })
        })
        .unwrap_or(Resolution {
            index: 0,
            strategy: "default",
        })
}

fn answer_text(raw: &JsonValue) -> String {
    match raw {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Array(a) if a.is_empty() => String::new(),
        JsonValue::Object(o) if o.is_empty() => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn clamp_index(n: i64) -> usize {
    n.clamp(0, MAX_INDEX) as usize
}

/// 1..=4 is read as 1-based, everything else is clamped.
fn from_text_numeral(n: i64) -> usize {
    if (1..=OPTION_COUNT as i64).contains(&n) {
        (n - 1) as usize
    } else {
        clamp_index(n)
    }
}

fn integer_value(ctx: &AnswerContext<'_>) -> Option<usize> {
    match ctx.raw {
        JsonValue::Number(n) => n
            .as_i64()
            .map(clamp_index)
            .or_else(|| n.as_u64().map(|_| MAX_INDEX as usize)),
        JsonValue::Bool(b) => Some(usize::from(*b)),
        _ => None,
    }
}

fn labelled_numeral_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:option|choice|answer)\s*[:\-]?\s*(\d)").expect("valid numeral regex")
    })
}

fn labelled_letter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:option|choice|answer)\s*[:\-]?\s*([ABCD])").expect("valid letter regex")
    })
}

fn labelled_numeral(ctx: &AnswerContext<'_>) -> Option<usize> {
    let caps = labelled_numeral_re().captures(&ctx.text)?;
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;
    Some(from_text_numeral(n))
}

fn bare_numeral(ctx: &AnswerContext<'_>) -> Option<usize> {
    let trimmed = ctx.text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(from_text_numeral(n));
    }
    // Too large for i64 but still an integer: clamps to the last option.
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        return Some(MAX_INDEX as usize);
    }
    None
}

fn letter_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    LETTERS.iter().position(|&l| l == upper)
}

fn labelled_letter(ctx: &AnswerContext<'_>) -> Option<usize> {
    let caps = labelled_letter_re().captures(&ctx.text)?;
    let letter = caps.get(1)?.as_str().chars().next()?;
    letter_index(letter)
}

fn bare_letter(ctx: &AnswerContext<'_>) -> Option<usize> {
    let upper = ctx.text.trim().to_uppercase();
    let mut chars = upper.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => letter_index(letter),
        _ => None,
    }
}

/// Equal, containing, or contained by the answer text. An empty answer text
/// is contained by every option, so it selects the first non-empty one.
fn option_text(ctx: &AnswerContext<'_>) -> Option<usize> {
    let wanted = normalize_tokens(&ctx.text);
    ctx.options.iter().position(|option| {
        let normalized = normalize_tokens(option);
        !normalized.is_empty()
            && (normalized == wanted
                || wanted.contains(normalized.as_str())
                || normalized.contains(wanted.as_str()))
    })
}

fn first_option(_: &AnswerContext<'_>) -> Option<usize> {
    Some(0)
}

fn explanation_mention(ctx: &AnswerContext<'_>) -> Option<usize> {
    let explanation = normalize_tokens(ctx.explanation?);
    ctx.options.iter().position(|option| {
        let normalized = normalize_tokens(option);
        !normalized.is_empty() && explanation.contains(normalized.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(items: [&str; 4]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn abcd() -> Vec<String> {
        opts(["a", "b", "c", "d"])
    }

    #[test]
    fn integers_are_zero_based_and_clamped() {
        assert_eq!(resolve(&json!(2), &abcd(), None), 2);
        assert_eq!(resolve(&json!(0), &abcd(), None), 0);
        assert_eq!(resolve(&json!(9), &abcd(), None), 3);
        assert_eq!(resolve(&json!(-3), &abcd(), None), 0);
        assert_eq!(
            resolve_with_strategy(&json!(1), &abcd(), None).strategy,
            "integer"
        );
    }

    #[test]
    fn numeral_strings_are_one_based() {
        assert_eq!(resolve(&json!("2"), &abcd(), None), 1);
        assert_eq!(resolve(&json!(" 4 "), &abcd(), None), 3);
        assert_eq!(resolve(&json!("0"), &abcd(), None), 0);
        assert_eq!(resolve(&json!("7"), &abcd(), None), 3);
        assert_eq!(resolve(&json!("-1"), &abcd(), None), 0);
        assert_eq!(resolve(&json!("99999999999999999999999"), &abcd(), None), 3);
    }

    #[test]
    fn labelled_numerals_are_one_based() {
        let r = resolve_with_strategy(&json!("Option 3"), &abcd(), None);
        assert_eq!(r.index, 2);
        assert_eq!(r.strategy, "labelled_numeral");
        assert_eq!(resolve(&json!("answer: 1"), &abcd(), None), 0);
        assert_eq!(resolve(&json!("Choice - 4"), &abcd(), None), 3);
        assert_eq!(resolve(&json!("option 0"), &abcd(), None), 0);
        assert_eq!(resolve(&json!("option 8"), &abcd(), None), 3);
    }

    #[test]
    fn letters_resolve_with_or_without_label() {
        let r = resolve_with_strategy(&json!("Answer: B"), &abcd(), None);
        assert_eq!(r.index, 1);
        assert_eq!(r.strategy, "labelled_letter");
        assert_eq!(resolve(&json!("C"), &abcd(), None), 2);
        assert_eq!(resolve(&json!(" d "), &abcd(), None), 3);
        assert_eq!(resolve(&json!("option-a"), &abcd(), None), 0);
    }

    #[test]
    fn labelled_numeral_beats_labelled_letter() {
        let r = resolve_with_strategy(&json!("Answer: 3 (C)"), &abcd(), None);
        assert_eq!(r.index, 2);
        assert_eq!(r.strategy, "labelled_numeral");
    }

    #[test]
    fn free_text_matches_option_text() {
        let options = opts(["Stack", "Queue", "Heap", "Binary search tree"]);
        assert_eq!(resolve(&json!("queue"), &options, None), 1);
        assert_eq!(resolve(&json!("The heap!"), &options, None), 2);
        assert_eq!(resolve(&json!("binary search"), &options, None), 3);
        assert_eq!(
            resolve_with_strategy(&json!("queue"), &options, None).strategy,
            "option_text"
        );
    }

    #[test]
    fn empty_answer_falls_back_to_explanation_text() {
        let options = opts(["Stack", "Queue", "Heap", "Tree"]);
        let r = resolve_with_strategy(
            &json!(""),
            &options,
            Some("The answer is Queue because it is FIFO"),
        );
        assert_eq!(r.index, 1);
        assert_eq!(r.strategy, "option_text");

        let r = resolve_with_strategy(&JsonValue::Null, &options, Some("Answer: D"));
        assert_eq!(r.index, 3);
        assert_eq!(r.strategy, "labelled_letter");
    }

    #[test]
    fn unmatched_answer_uses_explanation_mentions() {
        let options = opts(["Paris", "Berlin", "Madrid", "Rome"]);
        let r = resolve_with_strategy(
            &json!("the capital on the Spree"),
            &options,
            Some("Berlin sits on the Spree river."),
        );
        assert_eq!(r.index, 1);
        assert_eq!(r.strategy, "explanation_mention");
    }

    #[test]
    fn unresolvable_input_defaults_to_zero() {
        assert_eq!(resolve(&JsonValue::Null, &[], None), 0);
        let options = opts(["Paris", "Berlin", "Madrid", "Rome"]);
        let r = resolve_with_strategy(&json!("no idea at all"), &options, None);
        assert_eq!(r.index, 0);
        assert_eq!(r.strategy, "default");
    }

    #[test]
    fn empty_answer_selects_first_non_empty_option() {
        let options = opts(["", "Berlin", "Madrid", ""]);
        assert_eq!(resolve(&JsonValue::Null, &options, None), 1);
    }

    #[test]
    fn floats_are_treated_as_text() {
        let options = opts(["1.5", "2.0", "3.5", "4.0"]);
        assert_eq!(resolve(&json!(2.0), &options, None), 1);
    }
}
