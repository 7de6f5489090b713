use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::study_service::StudyMode;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StudyPayload {
    #[validate(length(min = 1, max = 200000))]
    pub input: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudyResponse {
    pub mode: StudyMode,
    pub content: String,
}
