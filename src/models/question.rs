use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::text::question_key;

pub const OPTION_COUNT: usize = 4;

/// Canonical multiple-choice question. `answer_index` always points into the
/// current order of `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub question: String,
    #[schema(value_type = Vec<String>, min_items = 4, max_items = 4)]
    pub options: [String; OPTION_COUNT],
    pub answer_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    pub fn key(&self) -> String {
        question_key(&self.question)
    }

    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.answer_index)
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Quiz {
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Number of questions a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QuestionCount(usize);

impl QuestionCount {
    pub const ALLOWED: [usize; 4] = [10, 20, 30, 50];
    pub const DEFAULT: QuestionCount = QuestionCount(10);

    /// Anything outside the allowed set becomes the default.
    pub fn normalize(requested: Option<i64>) -> Self {
        requested
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| Self::ALLOWED.contains(n))
            .map(QuestionCount)
            .unwrap_or(Self::DEFAULT)
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Completion budget large enough for the whole JSON payload.
    pub fn token_budget(self) -> u32 {
        match self.0 {
            20 => 2000,
            30 => 2800,
            50 => 3800,
            _ => 1200,
        }
    }
}

impl Default for QuestionCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}
