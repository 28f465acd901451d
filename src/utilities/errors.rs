//! Error types for reply synthesis.

use std::time::Duration;

use thiserror::Error;

/// Failures an [`InferenceEngine`](crate::llms::engine::InferenceEngine) may report.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached.
    #[error("inference engine unreachable: {message}")]
    Transport { message: String },

    /// The engine answered with a non-success status.
    #[error("inference engine returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The engine answered but the payload could not be interpreted.
    #[error("malformed inference engine response: {message}")]
    Malformed { message: String },

    /// The engine refused or failed the generation itself.
    #[error("{message}")]
    Rejected { message: String },
}

impl EngineError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed {
                message: e.to_string(),
            }
        } else {
            Self::Transport {
                message: e.to_string(),
            }
        }
    }
}

/// Failures of a [`ResponseSynthesizer`](crate::llms::synthesizer::ResponseSynthesizer).
///
/// Never reaches the transport: the chat session renders it as reply text.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("reply generation timed out after {0:?}")]
    Timeout(Duration),
}
