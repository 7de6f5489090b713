//! Quiz assembly. A build walks a fixed sequence of states and always ends
//! with exactly the requested number of well-formed questions: generation and
//! parse failures only ever shrink the candidate list, and later states make
//! up the difference from synthesized questions.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;
use crate::models::difficulty::Difficulty;
use crate::models::question::{Question, QuestionCount, Quiz, OPTION_COUNT};
use crate::services::llm_service::{GenerationRequest, TextGenerator};
use crate::services::prompt_builder::{self, RETRY_TEMPERATURE};
use crate::services::{question_sanitizer, quiz_synthesizer, response_extractor};
use crate::utils::text::topic_label;

/// Model identities for quiz builds, derived once from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSettings {
    pub model: String,
    pub retry_model: String,
    pub retry_temperature: f32,
}

impl QuizSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.quiz_model.clone(),
            retry_model: config.quiz_retry_model.clone(),
            retry_temperature: RETRY_TEMPERATURE,
        }
    }
}

/// Everything a single build needs, fixed up front.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizPlan {
    pub topic: String,
    pub difficulty: Difficulty,
    pub count: QuestionCount,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl QuizPlan {
    pub fn new(
        topic: impl Into<String>,
        difficulty: Difficulty,
        count: QuestionCount,
        settings: &QuizSettings,
    ) -> Self {
        Self {
            topic: topic.into(),
            difficulty,
            count,
            model: settings.model.clone(),
            max_tokens: count.token_budget(),
            temperature: difficulty.temperature(),
        }
    }

    fn primary_request(&self) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            prompt: prompt_builder::quiz_prompt(&self.topic, self.difficulty, self.count),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn retry_request(&self, settings: &QuizSettings) -> GenerationRequest {
        GenerationRequest {
            model: settings.retry_model.clone(),
            prompt: prompt_builder::strict_quiz_prompt(&self.topic, self.difficulty, self.count),
            temperature: settings.retry_temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Primary,
    Retry,
}

enum BuildState {
    Generate,
    Extract(Attempt, String),
    Sanitize(Attempt, Vec<JsonValue>),
    RetryOnEmpty,
    Synthesize,
    FillShortfall(Vec<Question>, HashSet<String>),
    Truncate(Vec<Question>),
    Shuffle(Vec<Question>),
    Done(Vec<Question>),
}

#[derive(Clone)]
pub struct QuizService {
    generator: Arc<dyn TextGenerator>,
    settings: QuizSettings,
}

impl QuizService {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: QuizSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Normalizes raw caller input into a plan.
    pub fn plan(&self, topic: &str, difficulty: &str, num_questions: Option<i64>) -> QuizPlan {
        QuizPlan::new(
            topic,
            Difficulty::parse(difficulty),
            QuestionCount::normalize(num_questions),
            &self.settings,
        )
    }

    pub async fn build(&self, topic: &str, difficulty: &str, num_questions: Option<i64>) -> Quiz {
        self.build_quiz(&self.plan(topic, difficulty, num_questions))
            .await
    }

    /// Never fails; see the module docs.
    pub async fn build_quiz(&self, plan: &QuizPlan) -> Quiz {
        let needed = plan.count.get();
        let label = topic_label(&plan.topic, 60);
        let mut generated = 0usize;
        let mut synthetic = 0usize;
        let mut retried = false;

        let mut state = BuildState::Generate;
        let questions = loop {
            state = match state {
                BuildState::Generate => {
                    match self.generator.generate(&plan.primary_request()).await {
                        Ok(text) => BuildState::Extract(Attempt::Primary, text),
                        Err(e) => {
                            tracing::warn!(error = %e, topic = %label, "quiz generation failed");
                            BuildState::Sanitize(Attempt::Primary, Vec::new())
                        }
                    }
                }
                BuildState::Extract(attempt, text) => {
                    tracing::debug!(?attempt, reply_chars = text.len(), "extracting quiz items");
                    BuildState::Sanitize(attempt, response_extractor::extract_items(&text))
                }
                BuildState::Sanitize(attempt, items) => {
                    let (kept, taken) = sanitize_and_dedupe(&items);
                    generated = kept.len();
                    match (kept.is_empty(), attempt) {
                        (false, _) => BuildState::FillShortfall(kept, taken),
                        (true, Attempt::Primary) => BuildState::RetryOnEmpty,
                        (true, Attempt::Retry) => BuildState::Synthesize,
                    }
                }
                BuildState::RetryOnEmpty => {
                    retried = true;
                    tracing::warn!(
                        topic = %label,
                        model = %self.settings.retry_model,
                        "no usable questions, retrying with strict prompt"
                    );
                    let request = plan.retry_request(&self.settings);
                    match self.generator.generate(&request).await {
                        Ok(text) => BuildState::Extract(Attempt::Retry, text),
                        Err(e) => {
                            tracing::warn!(error = %e, "quiz retry failed");
                            BuildState::Synthesize
                        }
                    }
                }
                BuildState::Synthesize => {
                    tracing::warn!(topic = %label, needed, "falling back to a synthesized quiz");
                    synthetic = needed;
                    BuildState::Truncate(quiz_synthesizer::synthesize(&plan.topic, needed))
                }
                BuildState::FillShortfall(mut kept, mut taken) => {
                    if kept.len() < needed {
                        let shortfall = needed - kept.len();
                        tracing::warn!(
                            topic = %label,
                            kept = kept.len(),
                            shortfall,
                            "filling quiz shortfall with synthesized questions"
                        );
                        synthetic = shortfall;
                        kept.extend(quiz_synthesizer::fill(&plan.topic, shortfall, &mut taken));
                    }
                    BuildState::Truncate(kept)
                }
                BuildState::Truncate(mut questions) => {
                    questions.truncate(needed);
                    BuildState::Shuffle(questions)
                }
                BuildState::Shuffle(questions) => BuildState::Done(shuffle_all(questions)),
                BuildState::Done(questions) => break questions,
            };
        };

        tracing::info!(
            topic = %label,
            difficulty = %plan.difficulty,
            requested = needed,
            generated,
            synthetic,
            retried,
            "quiz built"
        );
        Quiz { questions }
    }
}

/// Sanitizes every item, dropping blank stems and repeated stems (first
/// occurrence wins). Also returns the keys of everything kept.
fn sanitize_and_dedupe(items: &[JsonValue]) -> (Vec<Question>, HashSet<String>) {
    let mut taken = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        let question = question_sanitizer::sanitize(item);
        if question.question.is_empty() {
            continue;
        }
        if taken.insert(question.key()) {
            kept.push(question);
        }
    }
    if kept.len() < items.len() {
        tracing::debug!(
            received = items.len(),
            kept = kept.len(),
            "dropped blank or duplicate questions"
        );
    }
    (kept, taken)
}

/// Permutes the options and moves `answer_index` with the option it pointed
/// at. The correct option is tracked by position, never re-matched by text.
pub fn shuffle_options<R: Rng + ?Sized>(question: Question, rng: &mut R) -> Question {
    let Question {
        question,
        options,
        answer_index,
        explanation,
    } = question;

    let mut indexed: Vec<(usize, String)> = options.into_iter().enumerate().collect();
    indexed.shuffle(rng);
    let answer_index = indexed
        .iter()
        .position(|(original, _)| *original == answer_index)
        .unwrap_or(0);

    let mut reordered = indexed.into_iter().map(|(_, option)| option);
    let options: [String; OPTION_COUNT] =
        std::array::from_fn(|_| reordered.next().unwrap_or_default());

    Question {
        question,
        options,
        answer_index,
        explanation,
    }
}

fn shuffle_all(questions: Vec<Question>) -> Vec<Question> {
    let mut rng = rand::thread_rng();
    questions
        .into_iter()
        .map(|q| shuffle_options(q, &mut rng))
        .collect()
}
