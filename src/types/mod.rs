//! Wire types.

pub mod chat;

pub use chat::{ChatRequest, HealthResponse, Message, ReplyEnvelope, ReplyMessage, Role};
