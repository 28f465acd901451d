//! Chat wire models.
//!
//! Field names match the JSON consumed and produced by the TypeAI frontend.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role tag of a chat message.
///
/// Unknown role strings are accepted as [`Role::Other`] and serialized back
/// unchanged; they get no special handling and end up in the history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(raw),
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::from(raw.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<Role>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Body of `POST /api/chat` and `POST /api/chat/stream`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Ordered conversation, oldest first.
    pub messages: Vec<Message>,
    /// Accepted for compatibility, `null` included. Streaming is selected by
    /// route, not by this flag.
    #[serde(default)]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            stream: None,
        }
    }
}

/// The `message` object of a [`ReplyEnvelope`]. Role is always `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub role: Role,
    pub content: String,
}

/// Wire-level reply: one per request, or one per frame of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub id: String,
    pub message: ReplyMessage,
    /// Unix seconds.
    pub created: i64,
}

impl ReplyEnvelope {
    /// Build an envelope with a freshly generated id.
    pub fn new(content: impl Into<String>, created: i64) -> Self {
        Self::with_id(new_reply_id(), content, created)
    }

    /// Build an envelope that reuses `id`; frames of one stream share it.
    pub fn with_id(id: impl Into<String>, content: impl Into<String>, created: i64) -> Self {
        Self {
            id: id.into(),
            message: ReplyMessage {
                role: Role::Assistant,
                content: content.into(),
            },
            created,
        }
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Fresh reply identifier (UUID v4, hyphenated).
pub fn new_reply_id() -> String {
    Uuid::new_v4().to_string()
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
    /// Local wall time, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
}
