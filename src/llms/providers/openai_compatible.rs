//! OpenAI-compatible inference engine.
//!
//! Talks to any server exposing `POST /chat/completions` and `GET /models`
//! under a common base URL (llama.cpp server, vLLM, text-generation-inference,
//! or a hosted endpoint). Each `generate` call is one non-streaming
//! completion request.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::llms::engine::{InferenceEngine, SamplingParams};
use crate::types::chat::Message;
use crate::utilities::errors::EngineError;

/// Default model name sent with each request.
pub const DEFAULT_MODEL: &str = "mistral-7b-instruct";

/// Default per-request HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest slice of an error body kept in [`EngineError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// Connection settings for [`OpenAiCompatibleEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL, e.g. `http://127.0.0.1:8000/v1`. A trailing slash is ignored.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl EngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleEngine {
    config: EngineConfig,
    client: reqwest::Client,
}

impl OpenAiCompatibleEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Check that the server answers `GET /models`.
    ///
    /// Used once at startup to decide whether the engine is ready.
    pub async fn probe(&self) -> Result<(), EngineError> {
        let response = self
            .authorize(self.client.get(self.endpoint("models")))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, response).await)
        }
    }

    fn build_messages<'a>(
        user_input: &'a str,
        history: &'a [Message],
        system_prompt: &'a str,
    ) -> Vec<WireMessage<'a>> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        messages.extend(history.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));
        if !user_input.is_empty() {
            messages.push(WireMessage {
                role: "user",
                content: user_input,
            });
        }
        messages
    }
}

#[async_trait]
impl InferenceEngine for OpenAiCompatibleEngine {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        user_input: &str,
        history: &[Message],
        system_prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, EngineError> {
        let body = CompletionRequest {
            model: &self.config.model,
            messages: Self::build_messages(user_input, history, system_prompt),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stream: false,
        };
        debug!(
            model = %self.config.model,
            messages = body.messages.len(),
            "sending completion request"
        );

        let response = self
            .authorize(self.client.post(self.endpoint("chat/completions")))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err = status_error(status, response).await;
            warn!(error = %err, "completion request failed");
            return Err(err);
        }

        let text = response.text().await?;
        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| EngineError::Malformed {
                message: format!("{e}: {}", truncate(&text, MAX_ERROR_BODY)),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EngineError::Malformed {
                message: "response has no choices[0].message.content".to_string(),
            })
    }
}

async fn status_error(status: reqwest::StatusCode, response: reqwest::Response) -> EngineError {
    let body = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);
    EngineError::Status {
        status: status.as_u16(),
        body: truncate(&body, MAX_ERROR_BODY).to_string(),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
