//! Instructions sent to the generative service: the calibrated quiz prompts
//! plus the prompts for the other study generators.

use serde_json::json;

use crate::models::difficulty::Difficulty;
use crate::models::question::QuestionCount;

/// Persona sent as the system message on every completion.
pub const SYSTEM_PROMPT: &str = "You are an AI study assistant. \
Respond concisely, clearly, and never mention any other product names.";

/// Temperature for the strict quiz retry.
pub const RETRY_TEMPERATURE: f32 = 0.2;

fn quiz_schema() -> String {
    json!({
        "quiz": [
            {
                "question": "",
                "options": ["", "", "", ""],
                "answer_index": 0,
                "explanation": ""
            }
        ]
    })
    .to_string()
}

/// Reasoning depth expected at each difficulty.
pub fn difficulty_rubric(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "Easy: Recall/recognition questions. Single-concept definitions and direct facts. \
             Short stems, no multi-step reasoning. Distractors clearly incorrect; avoid tricks."
        }
        Difficulty::Medium => {
            "Medium: Application/comprehension. Small scenarios with one-step reasoning or calculation. \
             Plausible distractors reflecting common mistakes. Moderate stem length."
        }
        Difficulty::Hard => {
            "Hard: Multi-step reasoning/calculation, integrate multiple concepts. Realistic scenarios or \
             code snippets requiring analysis. Distractors include subtle misconceptions; careful reading required."
        }
        Difficulty::GodLevel => {
            "God Level: Graduate/olympiad-style difficulty. Novel edge-case scenarios, multi-part reasoning, \
             proof sketches or counterexamples. Numeric problems needing multiple computations; code with tricky \
             edge cases. Distractors are very plausible but wrong for subtle reasons. Explanations briefly justify \
             the correct choice and why others fail."
        }
    }
}

pub fn quiz_prompt(topic: &str, difficulty: Difficulty, count: QuestionCount) -> String {
    format!(
        r#"Create a {difficulty} quiz with exactly {count} questions from the user's topic or passage.

Strict output rules:
- OUTPUT MUST BE VALID JSON ONLY. NO extra text or markdown.
- Use this exact schema: {schema}
- "options" must have exactly 4 choices. Use clear, non-ambiguous options.
- "answer_index" is the 0-based index of the correct option.
- Include a concise "explanation" for the correct answer.

Strict difficulty rules:
{rubric}
- Match difficulty by required reasoning depth, not just wording.
- Avoid repeating the same knowledge point across more than 20% of questions.
- Question stems MUST be unique; do not rephrase the same question.
- For "god level": at least 30% of questions require multi-step reasoning or formal justification.

Diversity & coverage:
- If input is a broad topic, distribute across important subtopics.
- Mix skills: recall, understanding, application, synthesis (appropriately scaled by difficulty).

Topic or Text Input:
{topic}"#,
        difficulty = difficulty.label(),
        count = count.get(),
        schema = quiz_schema(),
        rubric = difficulty_rubric(difficulty),
        topic = topic.trim(),
    )
}

/// Shorter variant for the single retry; forbids markdown outright.
pub fn strict_quiz_prompt(topic: &str, difficulty: Difficulty, count: QuestionCount) -> String {
    format!(
        "Return ONLY valid JSON matching this exact schema (no markdown): {schema}\n\
         Create a {difficulty} quiz with exactly {count} questions.\n\
         Topic or Text Input:\n{topic}",
        schema = quiz_schema(),
        difficulty = difficulty.label(),
        count = count.get(),
        topic = topic.trim(),
    )
}

pub fn solver_prompt(problem: &str) -> String {
    format!(
        "Read the user's problem or doubt and provide a helpful, step-by-step solution.\n\nUser: {}",
        problem.trim()
    )
}

pub fn notes_prompt(text: &str) -> String {
    format!(
        r#"Create very detailed long study notes from the user's text.

Strict Coverage & Depth:
- Enumerate all core topics AND minor subtopics; do not skip small concepts.
- Group content into well-structured sections with clear hierarchy.
- Explain every concept thoroughly with definitions, intuition, and formal view.
- Include worked examples, edge cases, and step-by-step derivations or algorithms.
- Present formulas with variable definitions; for code, include annotated snippets.
- Call out common pitfalls and misconceptions; add practical tips.

Structure Requirements:
- Write AT LEAST 6-10 sections with `##` headings.
- Under each section, include 2-4 paragraphs (3-6 sentences each).
- Use occasional sub-bullets only when clarifying lists; do not switch to bullet-only output.
- Target overall length 1500-2500 words depending on topic scope.

Output format:
- Markdown with headings (##) for sections; paragraphs under each.
- Use math/code blocks or inline formula notation when relevant.
- Keep explanations precise and rich; avoid rambling.

Input Text:
{}"#,
        text.trim()
    )
}

pub fn explain_prompt(concept: &str) -> String {
    format!(
        r#"Your job is to explain academic concepts clearly.

If the user's input sounds like a topic (e.g., 'Normalization in DBMS' or 'Binary Trees'),
explain it with key points, examples, and analogies.

If it sounds like an instruction (e.g., 'make a quiz', 'summarize this'),
gently respond with: "It looks like you might want to use the Quiz or Summarizer mode instead."

Topic: {}"#,
        concept.trim()
    )
}

pub fn summarize_prompt(text: &str) -> String {
    format!(
        r#"Create a concise summary from the user's academic notes.

If the text is less than 50 words, say:
"This text is too short to summarize. Please provide a longer passage."

Otherwise, summarize it into clear, bullet-point sections:
- Key Definitions
- Important Points
- Summary

Text: {}"#,
        text.trim()
    )
}

/// Free-form practice quiz rendered as text rather than JSON.
pub fn practice_quiz_prompt(text: &str) -> String {
    format!(
        r#"Create a mixed-format practice quiz from the user's topic or passage.

If the input is a topic name (e.g., "DBMS", "Machine Learning"), create questions on that topic.
If it's a text passage, generate questions from the given content.
Each question should include 4 options (A-D) and the correct answer below.
The types of questions can be:
- Multiple Choice
- True/False
- Fill in the Blanks
- Descriptive

Content: {}"#,
        text.trim()
    )
}
