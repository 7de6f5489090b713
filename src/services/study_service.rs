use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::llm_service::{GenerationRequest, TextGenerator, TextStream};
use crate::services::prompt_builder;

const SOLVER_MAX_TOKENS: u32 = 3000;
const PRACTICE_QUIZ_MAX_TOKENS: u32 = 1200;
const NOTES_TEMPERATURE: f32 = 0.3;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The free-text study generators that sit next to the quiz builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StudyMode {
    Solver,
    Notes,
    Explainer,
    Summarizer,
    PracticeQuiz,
}

impl StudyMode {
    pub const ALL: [StudyMode; 5] = [
        StudyMode::Solver,
        StudyMode::Notes,
        StudyMode::Explainer,
        StudyMode::Summarizer,
        StudyMode::PracticeQuiz,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StudyMode::Solver => "solver",
            StudyMode::Notes => "notes",
            StudyMode::Explainer => "explainer",
            StudyMode::Summarizer => "summarizer",
            StudyMode::PracticeQuiz => "practice-quiz",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let wanted = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| Error::BadRequest(format!("Unknown study mode: {}", raw)))
    }

    fn prompt(self, input: &str) -> String {
        match self {
            StudyMode::Solver => prompt_builder::solver_prompt(input),
            StudyMode::Notes => prompt_builder::notes_prompt(input),
            StudyMode::Explainer => prompt_builder::explain_prompt(input),
            StudyMode::Summarizer => prompt_builder::summarize_prompt(input),
            StudyMode::PracticeQuiz => prompt_builder::practice_quiz_prompt(input),
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model and sampling per mode.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySettings {
    pub default_model: String,
    pub solver_model: String,
    pub notes_model: String,
    pub quiz_model: String,
    pub notes_max_tokens: u32,
    pub default_max_tokens: u32,
}

impl StudySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_model: config.preferred_model.clone(),
            solver_model: config.solver_model.clone(),
            notes_model: config.notes_model.clone(),
            quiz_model: config.quiz_model.clone(),
            notes_max_tokens: config.notes_max_tokens_long,
            default_max_tokens: config.notes_max_tokens_short,
        }
    }
}

#[derive(Clone)]
pub struct StudyService {
    generator: Arc<dyn TextGenerator>,
    settings: StudySettings,
}

impl StudyService {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: StudySettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn request(&self, mode: StudyMode, input: &str) -> Result<GenerationRequest> {
        if input.trim().is_empty() {
            return Err(Error::BadRequest("Input must not be empty".to_string()));
        }
        let s = &self.settings;
        let (model, temperature, max_tokens) = match mode {
            StudyMode::Solver => (&s.solver_model, DEFAULT_TEMPERATURE, SOLVER_MAX_TOKENS),
            StudyMode::Notes => (&s.notes_model, NOTES_TEMPERATURE, s.notes_max_tokens),
            StudyMode::PracticeQuiz => {
                (&s.quiz_model, DEFAULT_TEMPERATURE, PRACTICE_QUIZ_MAX_TOKENS)
            }
            StudyMode::Explainer | StudyMode::Summarizer => {
                (&s.default_model, DEFAULT_TEMPERATURE, s.default_max_tokens)
            }
        };
        Ok(GenerationRequest {
            model: model.clone(),
            prompt: mode.prompt(input),
            temperature,
            max_tokens,
        })
    }

    pub async fn generate(&self, mode: StudyMode, input: &str) -> Result<String> {
        let request = self.request(mode, input)?;
        tracing::info!(%mode, model = %request.model, "study generation");
        self.generator.generate(&request).await.map_err(|e| {
            tracing::error!(%mode, error = %e, "study generation failed");
            e
        })
    }

    pub async fn stream(&self, mode: StudyMode, input: &str) -> Result<TextStream> {
        let request = self.request(mode, input)?;
        tracing::info!(%mode, model = %request.model, "study stream");
        self.generator.stream(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm_service::MockTextGenerator;
    use futures_util::StreamExt;

    fn settings() -> StudySettings {
        StudySettings::from_config(&Config::with_api_key("test"))
    }

    #[test]
    fn modes_parse_from_path_segments() {
        assert_eq!(StudyMode::parse("solver").unwrap(), StudyMode::Solver);
        assert_eq!(StudyMode::parse("Practice-Quiz").unwrap(), StudyMode::PracticeQuiz);
        assert!(matches!(StudyMode::parse("chat"), Err(Error::BadRequest(_))));
        let json = serde_json::to_string(&StudyMode::PracticeQuiz).unwrap();
        assert_eq!(json, "\"practice-quiz\"");
    }

    #[test]
    fn each_mode_picks_its_model_and_budget() {
        let svc = StudyService::new(Arc::new(MockTextGenerator::new()), settings());
        let s = settings();

        let solver = svc.request(StudyMode::Solver, "2x = 4").unwrap();
        assert_eq!(solver.model, s.solver_model);
        assert_eq!(solver.max_tokens, 3000);

        let notes = svc.request(StudyMode::Notes, "Cells").unwrap();
        assert_eq!(notes.model, s.notes_model);
        assert_eq!(notes.max_tokens, 6500);
        assert_eq!(notes.temperature, 0.3);

        let practice = svc.request(StudyMode::PracticeQuiz, "DBMS").unwrap();
        assert_eq!(practice.model, s.quiz_model);
        assert_eq!(practice.max_tokens, 1200);

        let explain = svc.request(StudyMode::Explainer, "Recursion").unwrap();
        assert_eq!(explain.model, s.default_model);
        assert!(explain.prompt.ends_with("Topic: Recursion"));
    }

    #[test]
    fn blank_input_is_rejected() {
        let svc = StudyService::new(Arc::new(MockTextGenerator::new()), settings());
        assert!(matches!(
            svc.request(StudyMode::Summarizer, "  \n "),
            Err(Error::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn generate_surfaces_service_errors() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Err(Error::ServiceUnavailable("503".into())));
        let svc = StudyService::new(Arc::new(mock), settings());
        let err = svc.generate(StudyMode::Solver, "help").await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn stream_passes_fragments_through() {
        let mut mock = MockTextGenerator::new();
        mock.expect_stream().times(1).returning(|_| {
            let parts: Vec<Result<String>> = vec![Ok("Key ".into()), Ok("points".into())];
            Ok(Box::pin(futures_util::stream::iter(parts)) as TextStream)
        });
        let svc = StudyService::new(Arc::new(mock), settings());
        let parts: Vec<String> = svc
            .stream(StudyMode::Notes, "Mitosis")
            .await
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(parts.concat(), "Key points");
    }
}
