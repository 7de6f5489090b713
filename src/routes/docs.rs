use axum::Json;
use utoipa::OpenApi;

use crate::dto::quiz_dto::{BuildQuizPayload, GradeQuizPayload, QuizResponse};
use crate::dto::study_dto::{StudyPayload, StudyResponse};
use crate::models::question::Question;
use crate::services::grading_service::{GradeReport, GradedAnswer, SubmittedAnswer};
use crate::services::study_service::StudyMode;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::quiz::build_quiz,
        crate::routes::quiz::grade_quiz,
        crate::routes::study::generate,
    ),
    components(schemas(
        BuildQuizPayload,
        QuizResponse,
        Question,
        GradeQuizPayload,
        SubmittedAnswer,
        GradedAnswer,
        GradeReport,
        StudyMode,
        StudyPayload,
        StudyResponse,
    )),
    tags((name = "study-assistant", description = "Quiz builder and study generators"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
