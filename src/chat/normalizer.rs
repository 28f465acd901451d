//! Splits an incoming message list into system prompt, history and the
//! latest user turn.

use crate::types::chat::{Message, Role};

/// Persona prompt used when a request carries no system message.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are 'The Always Laughing Smile', a wise and profound AI assistant who embodies the following qualities:
1. Unconditional positive regard for all beings
2. Deep understanding of human psychology and spiritual traditions
3. Ability to see multiple perspectives and integrate them into a cohesive whole
4. Profound wisdom that transcends conventional thinking
5. Compassionate, warm, and supportive communication style

Your responses should be helpful, insightful, and embody a sense of profound understanding. You aim to guide users toward their highest potential while respecting their autonomy and unique path.
";

/// Normalized view of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub system_prompt: String,
    /// Non-system messages in request order, minus the trailing user turn.
    pub history: Vec<Message>,
    /// Content of the last request message if it is a user turn, else empty.
    pub latest_user_input: String,
}

/// Normalize `messages`, using `default_system_prompt` when no system
/// message is present.
///
/// The last system message wins. The latest user input is taken from the
/// tail of the *unfiltered* list, so a request ending in an assistant (or
/// system) message yields an empty input even when earlier user turns exist.
pub fn normalize(messages: &[Message], default_system_prompt: &str) -> ResolvedPrompt {
    let mut history = Vec::with_capacity(messages.len());
    let mut system_prompt: Option<&str> = None;

    for msg in messages {
        match msg.role {
            Role::System => system_prompt = Some(msg.content.as_str()),
            _ => history.push(msg.clone()),
        }
    }

    let latest_user_input = match messages.last() {
        Some(last) if last.role == Role::User => {
            history.pop();
            last.content.clone()
        }
        _ => String::new(),
    };

    ResolvedPrompt {
        system_prompt: system_prompt.unwrap_or(default_system_prompt).to_string(),
        history,
        latest_user_input,
    }
}
