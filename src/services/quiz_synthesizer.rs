//! Deterministic filler questions built from the topic alone. Used as the
//! full fallback when generation yields nothing, and to top up a short quiz.

use std::collections::HashSet;

use crate::models::question::{Question, OPTION_COUNT};
use crate::utils::text::topic_label;

const DEFAULT_TOPIC: &str = "General Knowledge";
const TOPIC_LABEL_CHARS: usize = 80;

/// Stem template and the option text that answers it.
struct Template {
    stem: &'static str,
    correct: &'static str,
}

const TEMPLATES: [Template; 10] = [
    Template {
        stem: "Which statement best describes {t}?",
        correct: "A concise definition of {t}",
    },
    Template {
        stem: "Which is a core property of {t}?",
        correct: "A defining property of {t}",
    },
    Template {
        stem: "Which is a typical use-case for {t}?",
        correct: "A practical application of {t}",
    },
    Template {
        stem: "Which is NOT true about {t}?",
        correct: "A claim that contradicts the definition of {t}",
    },
    Template {
        stem: "Which example best illustrates {t} in practice?",
        correct: "A worked example that applies {t}",
    },
    Template {
        stem: "Which benefit is associated with {t}?",
        correct: "A benefit gained by using {t}",
    },
    Template {
        stem: "Which limitation often applies to {t}?",
        correct: "A known limitation of {t}",
    },
    Template {
        stem: "Which step comes first when applying {t}?",
        correct: "Identifying the problem {t} is meant to solve",
    },
    Template {
        stem: "Which pitfall occurs when using {t} incorrectly?",
        correct: "A common misuse of {t}",
    },
    Template {
        stem: "Which comparison correctly contrasts {t} with an alternative?",
        correct: "A comparison that states how {t} differs from an alternative",
    },
];

const DISTRACTORS: [&str; OPTION_COUNT - 1] = [
    "An unrelated concept to {t}",
    "A common misconception about {t}",
    "A detail from a different field than {t}",
];

/// Exactly `needed` questions about `topic`, numbered from 1.
pub fn synthesize(topic: &str, needed: usize) -> Vec<Question> {
    fill(topic, needed, &mut HashSet::new())
}

/// Exactly `needed` questions whose keys are not in `taken`; every emitted
/// key is added to `taken`. The correct option rotates 0, 1, 2, 3, ... over
/// the generated items.
pub fn fill(topic: &str, needed: usize, taken: &mut HashSet<String>) -> Vec<Question> {
    let label = topic_label(topic, TOPIC_LABEL_CHARS);
    let label = if label.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        label
    };

    let mut out = Vec::with_capacity(needed);
    let mut i = 0usize;
    while out.len() < needed {
        let question = build(&label, i);
        i += 1;
        if taken.insert(question.key()) {
            out.push(question);
        }
    }
    out
}

fn build(label: &str, i: usize) -> Question {
    let template = &TEMPLATES[i % TEMPLATES.len()];
    let correct_at = i % OPTION_COUNT;
    let render = |s: &str| s.replace("{t}", label);

    let mut distractors = DISTRACTORS.iter().map(|&d| render(d));
    let options: [String; OPTION_COUNT] = std::array::from_fn(|slot| {
        if slot == correct_at {
            render(template.correct)
        } else {
            distractors.next().unwrap_or_default()
        }
    });
    let correct = options[correct_at].clone();

    Question {
        question: format!("{} [{}]", render(template.stem), i + 1),
        options,
        answer_index: correct_at,
        explanation: format!(
            "\"{}\" is the option that answers the question; the others are distractors.",
            correct
        ),
    }
}
