pub mod answer_resolver;
pub mod grading_service;
pub mod llm_service;
pub mod prompt_builder;
pub mod question_sanitizer;
pub mod quiz_service;
pub mod quiz_synthesizer;
pub mod response_extractor;
pub mod study_service;
