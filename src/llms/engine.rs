//! The inference engine boundary.
//!
//! Model loading, tokenization and sampling live behind [`InferenceEngine`].
//! Whether an engine is available is decided once at startup and captured
//! in an [`EngineState`] value that is handed to the chat session.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::chat::Message;
use crate::utilities::errors::EngineError;

/// Maximum number of tokens requested per reply.
pub const MAX_TOKENS: u32 = 600;
/// Sampling temperature.
pub const TEMPERATURE: f32 = 0.7;
/// Nucleus sampling cutoff.
pub const TOP_P: f32 = 0.9;

/// Sampling configuration passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }
}

/// A text-generation backend.
///
/// Implementations must tolerate concurrent calls through a shared
/// reference; any serialization they need is internal.
#[async_trait]
pub trait InferenceEngine: Send + Sync + fmt::Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Generate a reply to `user_input` given the prior turns.
    async fn generate(
        &self,
        user_input: &str,
        history: &[Message],
        system_prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, EngineError>;
}

/// Engine availability, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub enum EngineState {
    Unavailable,
    Ready(Arc<dyn InferenceEngine>),
}

impl EngineState {
    pub fn ready(engine: impl InferenceEngine + 'static) -> Self {
        Self::Ready(Arc::new(engine))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn engine(&self) -> Option<&Arc<dyn InferenceEngine>> {
        match self {
            Self::Ready(engine) => Some(engine),
            Self::Unavailable => None,
        }
    }
}
