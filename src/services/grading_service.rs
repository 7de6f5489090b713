use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::models::question::Question;

/// One submitted answer. `selected_index` is `None` when the question was
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubmittedAnswer {
    pub question_index: usize,
    pub selected_index: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GradedAnswer {
    pub question_index: usize,
    pub selected_index: Option<i64>,
    pub correct_index: usize,
    pub correct_option: String,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GradeReport {
    pub score: usize,
    pub total: usize,
    pub results: Vec<GradedAnswer>,
}

pub struct GradingService;

impl GradingService {
    /// Grades every question in order. Answers are locked on first
    /// submission, so a repeated `question_index` keeps the earliest one;
    /// answers for questions that do not exist are ignored.
    pub fn grade(questions: &[Question], answers: &[SubmittedAnswer]) -> GradeReport {
        let mut selected: HashMap<usize, Option<i64>> = HashMap::new();
        for answer in answers {
            if answer.question_index < questions.len() {
                selected
                    .entry(answer.question_index)
                    .or_insert(answer.selected_index);
            }
        }

        let results: Vec<GradedAnswer> = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                let selected_index = selected.get(&idx).copied().flatten();
                let is_correct = selected_index
                    .and_then(|s| usize::try_from(s).ok())
                    .is_some_and(|s| s == q.answer_index);
                GradedAnswer {
                    question_index: idx,
                    selected_index,
                    correct_index: q.answer_index,
                    correct_option: q.correct_option().to_string(),
                    is_correct,
                    explanation: q.explanation.clone(),
                }
            })
            .collect();

        let score = results.iter().filter(|r| r.is_correct).count();
        tracing::debug!(score, total = questions.len(), "quiz graded");
        GradeReport {
            score,
            total: questions.len(),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer_index: usize) -> Question {
        Question {
            question: format!("Q{}", answer_index),
            options: ["a", "b", "c", "d"].map(String::from),
            answer_index,
            explanation: "because".into(),
        }
    }

    fn answer(question_index: usize, selected: Option<i64>) -> SubmittedAnswer {
        SubmittedAnswer {
            question_index,
            selected_index: selected,
        }
    }

    #[test]
    fn scores_correct_answers() {
        let questions = vec![question(0), question(2), question(3)];
        let report = GradingService::grade(
            &questions,
            &[answer(0, Some(0)), answer(1, Some(1)), answer(2, Some(3))],
        );
        assert_eq!(report.score, 2);
        assert_eq!(report.total, 3);
        assert!(!report.results[1].is_correct);
        assert_eq!(report.results[1].correct_option, "c");
        assert_eq!(report.results[1].explanation, "because");
    }

    #[test]
    fn missing_and_out_of_range_selections_are_incorrect() {
        let questions = vec![question(0), question(1), question(1)];
        let report = GradingService::grade(&questions, &[answer(1, Some(7)), answer(2, Some(-1))]);
        assert_eq!(report.score, 0);
        assert_eq!(report.results[0].selected_index, None);
        assert_eq!(report.results[1].selected_index, Some(7));
    }

    #[test]
    fn first_answer_is_locked_and_unknown_questions_ignored() {
        let questions = vec![question(1)];
        let report = GradingService::grade(
            &questions,
            &[answer(0, Some(1)), answer(0, Some(2)), answer(5, Some(0))],
        );
        assert_eq!(report.score, 1);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].selected_index, Some(1));
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let report = GradingService::grade(&[], &[answer(0, Some(0))]);
        assert_eq!(report, GradeReport { score: 0, total: 0, results: vec![] });
    }
}
