//! # TypeAI backend
//!
//! Chat-completion service sitting between the TypeAI frontend and a
//! language-model inference engine. When no engine is available at startup
//! it keeps serving from a keyword-rule fallback, and every failure is
//! reported to the client as an assistant message rather than an HTTP error.

pub mod chat;
pub mod llms;
pub mod server;
pub mod types;
pub mod utilities;

pub use chat::{ChatSession, SessionConfig};
pub use llms::{EngineState, InferenceEngine};
pub use types::{ChatRequest, Message, ReplyEnvelope, Role};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
