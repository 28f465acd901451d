//! Chat request handling.
//!
//! ```text
//! ChatRequest.messages
//!   → normalize (system prompt, history, latest user turn)
//!   → synthesize (engine or fallback rules)
//!   → ReplyEnvelope, or a framed stream of them
//! ```

pub mod normalizer;
pub mod session;

pub use normalizer::{normalize, ResolvedPrompt, DEFAULT_SYSTEM_PROMPT};
pub use session::{ChatReply, ChatSession, DeliveryMode, FallbackPolicy, SessionConfig};
