pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::middleware::{cors::study_cors, rate_limit};
use crate::services::{
    llm_service::{LlmService, TextGenerator},
    quiz_service::{QuizService, QuizSettings},
    study_service::{StudyService, StudySettings},
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
    pub study_service: StudyService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()?;
        let llm = LlmService::from_config(config, http_client);
        Ok(Self::with_generator(config, Arc::new(llm)))
    }

    /// State over any backend; tests pass a scripted one.
    pub fn with_generator(config: &Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            quiz_service: QuizService::new(generator.clone(), QuizSettings::from_config(config)),
            study_service: StudyService::new(generator, StudySettings::from_config(config)),
        }
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/api/quiz", post(routes::quiz::build_quiz))
        .route("/api/quiz/grade", post(routes::quiz::grade_quiz))
        .route("/api/study/:mode", post(routes::study::generate))
        .route("/api/study/:mode/stream", post(routes::study::stream_generate))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RequestLimiter::new(config.public_rps),
            rate_limit::limit_requests,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/openapi.json", get(routes::docs::openapi_json))
        .merge(api)
        .with_state(state)
        .layer(study_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
}
