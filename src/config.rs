use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_timeout_secs: u64,
    pub preferred_model: String,
    pub quiz_model: String,
    pub quiz_retry_model: String,
    pub solver_model: String,
    pub notes_model: String,
    pub notes_max_tokens_short: u32,
    pub notes_max_tokens_long: u32,
    pub public_rps: u32,
    pub max_body_bytes: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            llm_api_key: get_env("FIREWORKS_API_KEY")?,
            llm_api_base_url: get_env_or(
                "LLM_API_BASE_URL",
                "https://api.fireworks.ai/inference/v1",
            ),
            llm_timeout_secs: get_env_parse_or("LLM_TIMEOUT_SECS", 120)?,
            preferred_model: get_env_or(
                "FIREWORKS_PREFERRED_MODEL",
                "accounts/fireworks/models/deepseek-v3p1",
            ),
            quiz_model: get_env_or("QUIZ_MODEL", "accounts/fireworks/models/qwen3-8b"),
            quiz_retry_model: get_env_or(
                "QUIZ_RETRY_MODEL",
                "accounts/fireworks/models/deepseek-v3p1",
            ),
            solver_model: get_env_or("SOLVER_MODEL", "accounts/fireworks/models/deepseek-v3p1"),
            notes_model: get_env_or(
                "NOTES_MODEL",
                "accounts/fireworks/models/mixtral-8x22b-instruct",
            ),
            notes_max_tokens_short: get_env_parse_or("NOTES_MAX_TOKENS_SHORT", 2200)?,
            notes_max_tokens_long: get_env_parse_or("NOTES_MAX_TOKENS_LONG", 6500)?,
            public_rps: get_env_parse_or("PUBLIC_RPS", 20)?,
            max_body_bytes: get_env_parse_or("MAX_BODY_BYTES", 2 * 1024 * 1024)?,
        })
    }

    /// Defaults for every optional setting; used by tests and local tooling
    /// that never touch the network.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            server_address: "127.0.0.1:0".to_string(),
            llm_api_key: api_key.into(),
            llm_api_base_url: "https://api.fireworks.ai/inference/v1".to_string(),
            llm_timeout_secs: 120,
            preferred_model: "accounts/fireworks/models/deepseek-v3p1".to_string(),
            quiz_model: "accounts/fireworks/models/qwen3-8b".to_string(),
            quiz_retry_model: "accounts/fireworks/models/deepseek-v3p1".to_string(),
            solver_model: "accounts/fireworks/models/deepseek-v3p1".to_string(),
            notes_model: "accounts/fireworks/models/mixtral-8x22b-instruct".to_string(),
            notes_max_tokens_short: 2200,
            notes_max_tokens_long: 6500,
            public_rps: 20,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
