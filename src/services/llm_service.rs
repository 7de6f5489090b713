use async_trait::async_trait;
use futures_util::{stream, Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::prompt_builder::SYSTEM_PROMPT;
use crate::utils::text::truncate_for_log;

/// Content fragments in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A chat-completion backend. The concatenation of everything `stream`
/// yields equals what `generate` returns for the same request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    async fn stream(&self, request: &GenerationRequest) -> Result<TextStream>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl LlmService {
    pub fn new(api_key: String, base_url: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url,
            timeout,
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            config.llm_api_key.clone(),
            config.llm_api_base_url.clone(),
            Duration::from_secs(config.llm_timeout_secs),
            client,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, payload: JsonValue) -> Result<reqwest::Response> {
        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::ServiceUnavailable(format!(
                "{} {}",
                status,
                truncate_for_log(&text, 300)
            )));
        }
        Ok(res)
    }
}

fn chat_payload(request: &GenerationRequest, stream: bool) -> JsonValue {
    let mut payload = json!({
        "model": request.model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": request.prompt}
        ],
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    });
    if stream {
        payload["stream"] = JsonValue::Bool(true);
    }
    payload
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        tracing::debug!(
            model = %request.model,
            max_tokens = request.max_tokens,
            prompt_chars = request.prompt.len(),
            "chat completion request"
        );
        let res = self.send(chat_payload(request, false)).await?;
        let body: ChatResponse = res.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| Error::ServiceUnavailable("completion had no message content".into()))
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<TextStream> {
        tracing::debug!(model = %request.model, "streaming chat completion request");
        let res = self.send(chat_payload(request, true)).await?;
        Ok(sse_fragments(Box::pin(res.bytes_stream())))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SseEvent {
    Delta(String),
    Done,
}

/// Splits a server-sent-event byte stream into lines. Bytes are buffered
/// until a newline so multi-byte characters split across chunks survive.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            events.extend(parse_sse_line(&String::from_utf8_lossy(&line)));
        }
        events
    }

    fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_sse_line(&String::from_utf8_lossy(&rest))
    }
}

/// `data: {...}` lines carrying a non-empty `choices[0].delta.content`, or
/// the `data: [DONE]` terminator. Everything else is skipped.
fn parse_sse_line(line: &str) -> Option<SseEvent> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    let value: JsonValue = serde_json::from_str(data).ok()?;
    let content = value.pointer("/choices/0/delta/content")?.as_str()?;
    (!content.is_empty()).then(|| SseEvent::Delta(content.to_string()))
}

struct SseState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S> SseState<S> {
    fn absorb(&mut self, events: impl IntoIterator<Item = SseEvent>) {
        for event in events {
            if self.finished {
                break;
            }
            match event {
                SseEvent::Delta(text) => self.pending.push_back(text),
                SseEvent::Done => self.finished = true,
            }
        }
    }
}

fn sse_fragments<S, B>(bytes: S) -> TextStream
where
    S: Stream<Item = reqwest::Result<B>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = SseState {
        bytes,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    let fragments = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(text) = state.pending.pop_front() {
                return Some((Ok(text), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.absorb(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(Error::from(e)), state));
                }
                None => {
                    let tail = state.decoder.finish();
                    state.absorb(tail);
                    state.finished = true;
                }
            }
        }
    });
    Box::pin(fragments)
}
