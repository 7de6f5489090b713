#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use study_assistant::config::Config;
use study_assistant::error::{Error, Result};
use study_assistant::services::llm_service::{GenerationRequest, TextGenerator, TextStream};
use study_assistant::{build_router, AppState};

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    Fragments(Vec<String>),
    BrokenStream(Vec<String>),
}

/// Replays a fixed script of replies and records every request. Once the
/// script runs out every call fails.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(script: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::new([])
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.seen.lock().unwrap().clone()
    }

    fn next(&self, request: &GenerationRequest) -> Reply {
        self.seen.lock().unwrap().push(request.clone());
        self.script.lock().unwrap().pop_front().unwrap_or(Reply::Fail)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        match self.next(request) {
            Reply::Text(text) => Ok(text),
            Reply::Fragments(parts) => Ok(parts.concat()),
            Reply::Fail | Reply::BrokenStream(_) => {
                Err(Error::ServiceUnavailable("scripted failure".into()))
            }
        }
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<TextStream> {
        let items: Vec<Result<String>> = match self.next(request) {
            Reply::Text(text) => vec![Ok(text)],
            Reply::Fragments(parts) => parts.into_iter().map(Ok).collect(),
            Reply::BrokenStream(parts) => parts
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(Error::ServiceUnavailable(
                    "connection reset".into(),
                ))))
                .collect(),
            Reply::Fail => return Err(Error::ServiceUnavailable("scripted failure".into())),
        };
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}

pub fn test_config() -> Config {
    let mut config = Config::with_api_key("fw-test");
    config.public_rps = 1000;
    config
}

pub fn setup_app(generator: Arc<ScriptedGenerator>) -> axum::Router {
    let config = test_config();
    let state = AppState::with_generator(&config, generator);
    build_router(state, &config)
}

pub fn quiz_item(i: usize) -> JsonValue {
    json!({
        "question": format!("Model question {}?", i),
        "options": [format!("correct {}", i), "wrong a", "wrong b", "wrong c"],
        "answer": "A",
        "explanation": format!("correct {} is right", i)
    })
}

pub fn quiz_reply(count: usize) -> String {
    let items: Vec<JsonValue> = (0..count).map(quiz_item).collect();
    format!(
        "Here is your quiz:\n```json\n{}\n```\nGood luck!",
        json!({ "quiz": items })
    )
}
