use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::quiz_dto::{BuildQuizPayload, GradeQuizPayload, QuizResponse};
use crate::error::{Error, Result};
use crate::services::grading_service::{GradeReport, GradingService};
use crate::utils::text::topic_label;
use crate::AppState;

const TOPIC_LABEL_CHARS: usize = 80;

#[utoipa::path(
    post,
    path = "/api/quiz",
    request_body = BuildQuizPayload,
    responses(
        (status = 200, description = "Quiz built (generated, gap-filled or synthesized)", body = QuizResponse),
        (status = 400, description = "Invalid request payload"),
        (status = 429, description = "Rate limit exceeded"),
    ),
)]
pub async fn build_quiz(
    State(state): State<AppState>,
    Json(payload): Json<BuildQuizPayload>,
) -> Result<Json<QuizResponse>> {
    payload.validate()?;
    if payload.topic.trim().is_empty() {
        return Err(Error::BadRequest("Topic must not be blank".to_string()));
    }

    let plan = state.quiz_service.plan(
        &payload.topic,
        payload.difficulty.as_deref().unwrap_or_default(),
        payload.num_questions,
    );
    let quiz = state.quiz_service.build_quiz(&plan).await;

    Ok(Json(QuizResponse {
        id: Uuid::new_v4(),
        topic: topic_label(&payload.topic, TOPIC_LABEL_CHARS),
        difficulty: plan.difficulty.label().to_string(),
        total: quiz.len(),
        questions: quiz.questions,
        created_at: Utc::now(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/quiz/grade",
    request_body = GradeQuizPayload,
    responses(
        (status = 200, description = "Answers graded", body = GradeReport),
        (status = 400, description = "Invalid request payload"),
    ),
)]
pub async fn grade_quiz(Json(payload): Json<GradeQuizPayload>) -> Result<Json<GradeReport>> {
    payload.validate()?;
    Ok(Json(GradingService::grade(&payload.questions, &payload.answers)))
}
