use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::question::Question;
use crate::services::grading_service::SubmittedAnswer;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BuildQuizPayload {
    /// Topic name or a study passage.
    #[validate(length(min = 1, max = 200000))]
    pub topic: String,
    /// `easy`, `medium`, `hard` or `god level`; anything else is `easy`.
    pub difficulty: Option<String>,
    /// One of 10, 20, 30, 50; anything else is 10.
    pub num_questions: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizResponse {
    pub id: Uuid,
    pub topic: String,
    pub difficulty: String,
    pub total: usize,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GradeQuizPayload {
    #[validate(length(min = 1))]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}
