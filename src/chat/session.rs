//! Per-request orchestration.
//!
//! A [`ChatSession`] is built once at startup from the [`EngineState`] and
//! shared by all requests. Each call normalizes the incoming messages, runs
//! the synthesizer chosen at construction and wraps the text into a
//! [`ReplyEnvelope`], either directly or as a framed stream.
//!
//! Synthesis failures never escape: they are rendered as the reply content,
//! so callers always receive a well-formed envelope.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, error, info};

use super::normalizer::{normalize, ResolvedPrompt, DEFAULT_SYSTEM_PROMPT};
use crate::llms::engine::EngineState;
use crate::llms::streaming::{FrameStream, FramerConfig, StreamFramer};
use crate::llms::synthesizer::{
    EngineBackedSynthesizer, FallbackSynthesizer, ResponseSynthesizer, UnavailableNotice,
};
use crate::types::chat::{ChatRequest, HealthResponse, Message, ReplyEnvelope};
use crate::utilities::clock::Clock;
use crate::utilities::errors::SynthesisError;

/// Default bound on a single synthesis.
pub const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(180);

/// Health timestamp format.
const HEALTH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What to answer with when no engine is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Keyword-rule responder.
    #[default]
    Rules,
    /// Fixed "model is not loaded" notice.
    Notice,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" => Ok(Self::Rules),
            "notice" => Ok(Self::Notice),
            other => Err(format!("unknown fallback policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub default_system_prompt: String,
    pub synthesis_timeout: Option<Duration>,
    pub fallback: FallbackPolicy,
    pub framer: FramerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            synthesis_timeout: Some(DEFAULT_SYNTHESIS_TIMEOUT),
            fallback: FallbackPolicy::Rules,
            framer: FramerConfig::default(),
        }
    }
}

/// How a reply is delivered. Chosen by the route that received the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Direct,
    Streamed,
}

/// A reply in the shape its [`DeliveryMode`] asks for.
pub enum ChatReply {
    Direct(ReplyEnvelope),
    Streamed(FrameStream),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Direct(envelope) => f.debug_tuple("Direct").field(envelope).finish(),
            ChatReply::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    engine_state: EngineState,
    synthesizer: Arc<dyn ResponseSynthesizer>,
    framer: StreamFramer,
    clock: Arc<dyn Clock>,
    default_system_prompt: String,
    synthesis_timeout: Option<Duration>,
}

impl ChatSession {
    pub fn new(engine_state: EngineState, config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let synthesizer: Arc<dyn ResponseSynthesizer> = match (&engine_state, config.fallback) {
            (EngineState::Ready(engine), _) => {
                Arc::new(EngineBackedSynthesizer::new(Arc::clone(engine)))
            }
            (EngineState::Unavailable, FallbackPolicy::Rules) => {
                Arc::new(FallbackSynthesizer::new(Arc::clone(&clock)))
            }
            (EngineState::Unavailable, FallbackPolicy::Notice) => Arc::new(UnavailableNotice),
        };
        info!(
            model_loaded = engine_state.is_ready(),
            synthesizer = synthesizer.kind(),
            "chat session ready"
        );

        Self {
            framer: StreamFramer::new(config.framer, Arc::clone(&clock)),
            engine_state,
            synthesizer,
            clock,
            default_system_prompt: config.default_system_prompt,
            synthesis_timeout: config.synthesis_timeout,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.engine_state.is_ready()
    }

    pub fn synthesizer_kind(&self) -> &'static str {
        self.synthesizer.kind()
    }

    pub fn resolve(&self, messages: &[Message]) -> ResolvedPrompt {
        normalize(messages, &self.default_system_prompt)
    }

    /// Run the synthesizer, bounded by the configured timeout.
    pub async fn synthesize(&self, prompt: &ResolvedPrompt) -> Result<String, SynthesisError> {
        match self.synthesis_timeout {
            Some(limit) => tokio::time::timeout(limit, self.synthesizer.synthesize(prompt))
                .await
                .map_err(|_| SynthesisError::Timeout(limit))?,
            None => self.synthesizer.synthesize(prompt).await,
        }
    }

    /// Reply text for `messages`. Failures become an apology.
    pub async fn reply_text(&self, messages: &[Message]) -> String {
        let prompt = self.resolve(messages);
        debug!(
            message_count = messages.len(),
            history_len = prompt.history.len(),
            has_user_input = !prompt.latest_user_input.is_empty(),
            "normalized chat request"
        );
        match self.synthesize(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, synthesizer = self.synthesizer.kind(), "error processing chat request");
                apology(&e)
            }
        }
    }

    /// Produce a single reply envelope.
    pub async fn handle(&self, request: &ChatRequest) -> ReplyEnvelope {
        let text = self.reply_text(&request.messages).await;
        ReplyEnvelope::new(text, self.clock.unix_seconds())
    }

    /// Produce the reply as a paced stream of frames sharing one id.
    pub async fn handle_streamed(&self, request: &ChatRequest) -> FrameStream {
        let text = self.reply_text(&request.messages).await;
        debug!(frames = self.framer.frame_count(&text), "streaming reply");
        self.framer.frame(text)
    }

    pub async fn respond(&self, request: &ChatRequest, mode: DeliveryMode) -> ChatReply {
        match mode {
            DeliveryMode::Direct => ChatReply::Direct(self.handle(request).await),
            DeliveryMode::Streamed => ChatReply::Streamed(self.handle_streamed(request).await),
        }
    }

    /// An envelope carrying an apology for `detail`, for failures that
    /// happen before a request reaches the session.
    pub fn failure_envelope(&self, detail: impl std::fmt::Display) -> ReplyEnvelope {
        ReplyEnvelope::new(apology(detail), self.clock.unix_seconds())
    }

    /// [`Self::failure_envelope`] delivered per `mode`; a streamed failure is
    /// a single frame.
    pub fn failure_reply(&self, detail: impl std::fmt::Display, mode: DeliveryMode) -> ChatReply {
        let envelope = self.failure_envelope(detail);
        match mode {
            DeliveryMode::Direct => ChatReply::Direct(envelope),
            DeliveryMode::Streamed => {
                ChatReply::Streamed(futures::stream::once(async move { envelope }).boxed())
            }
        }
    }

    pub fn health(&self) -> HealthResponse {
        let message = if self.model_loaded() {
            "TypeAI Backend API is running"
        } else {
            "TypeAI Backend API is running (fallback mode)"
        };
        HealthResponse {
            status: "ok".to_string(),
            message: message.to_string(),
            model_loaded: self.model_loaded(),
            timestamp: self.clock.now().format(HEALTH_TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Reply text reporting a failure to the user.
pub fn apology(detail: impl std::fmt::Display) -> String {
    format!("I'm sorry, an error occurred: {detail}")
}
