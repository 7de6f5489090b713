pub mod quiz_dto;
pub mod study_dto;
