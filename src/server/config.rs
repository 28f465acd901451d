//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

use crate::chat::session::SessionConfig;
use crate::llms::providers::openai_compatible::{EngineConfig, DEFAULT_MODEL};

/// Runtime configuration for the server binary.
///
/// Every field has a default so the server starts in fallback mode with no
/// environment variables set.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Inference engine to connect to; `None` runs without one.
    pub engine: Option<EngineConfig>,

    pub session: SessionConfig,
}

impl ServerConfig {
    /// Build [`ServerConfig`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let parse_or = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let host = env_or("TYPEAI_HOST", "0.0.0.0");
        let port = lookup("PORT")
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(3000);

        let engine = lookup("TYPEAI_ENGINE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| EngineConfig {
                base_url: url.trim().to_owned(),
                model: env_or("TYPEAI_ENGINE_MODEL", DEFAULT_MODEL),
                api_key: lookup("TYPEAI_ENGINE_API_KEY").filter(|k| !k.is_empty()),
                timeout: Duration::from_secs(parse_or("TYPEAI_ENGINE_TIMEOUT_SECS").unwrap_or(120)),
            });

        let mut session = SessionConfig::default();
        if let Some(prompt) = lookup("TYPEAI_SYSTEM_PROMPT").filter(|p| !p.trim().is_empty()) {
            session.default_system_prompt = prompt;
        }
        if let Some(secs) = parse_or("TYPEAI_SYNTHESIS_TIMEOUT_SECS") {
            session.synthesis_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(policy) = lookup("TYPEAI_FALLBACK").and_then(|v| v.parse().ok()) {
            session.fallback = policy;
        }
        if let Some(ms) = parse_or("TYPEAI_STREAM_PACING_MS") {
            session.framer.pacing = Duration::from_millis(ms);
        }
        if let Some(words) = parse_or("TYPEAI_STREAM_CHUNK_WORDS").filter(|w| *w > 0) {
            session.framer.chunk_words = words as usize;
        }
        if let Some(mode) = lookup("TYPEAI_STREAM_MODE").and_then(|v| v.parse().ok()) {
            session.framer.mode = mode;
        }
        if let Some(secs) = parse_or("TYPEAI_STREAM_BUDGET_SECS") {
            session.framer.budget = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Self {
            bind_address: format!("{host}:{port}"),
            log_level: env_or("TYPEAI_LOG", "info,typeai=debug"),
            log_json: lookup("TYPEAI_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            engine,
            session,
        }
    }
}
