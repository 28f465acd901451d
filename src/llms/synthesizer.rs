//! Reply synthesis.
//!
//! A [`ResponseSynthesizer`] turns a [`ResolvedPrompt`] into reply text.
//! Three implementations exist:
//!
//! - [`EngineBackedSynthesizer`] delegates to an [`InferenceEngine`] with the
//!   fixed [`SamplingParams`].
//! - [`FallbackSynthesizer`] answers from the keyword table in
//!   [`fallback_rules`](super::fallback_rules) when no engine is loaded.
//! - [`UnavailableNotice`] answers every request with a fixed notice that
//!   the model is not loaded.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::engine::{InferenceEngine, SamplingParams};
use super::fallback_rules::{self, DATE_FORMAT, DATE_PLACEHOLDER, DEFAULT_TEMPLATE};
use crate::chat::normalizer::ResolvedPrompt;
use crate::utilities::clock::Clock;
use crate::utilities::errors::SynthesisError;

/// Reply text of [`UnavailableNotice`].
pub const MODEL_NOT_LOADED: &str =
    "I'm sorry, the model is not currently loaded. Please check the server logs.";

/// Produces the reply text for one normalized request.
///
/// Only engine faults are reported as errors; no input is ever rejected.
#[async_trait]
pub trait ResponseSynthesizer: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs.
    fn kind(&self) -> &'static str;

    async fn synthesize(&self, prompt: &ResolvedPrompt) -> Result<String, SynthesisError>;
}

// ---------------------------------------------------------------------------
// EngineBackedSynthesizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EngineBackedSynthesizer {
    engine: Arc<dyn InferenceEngine>,
    params: SamplingParams,
}

impl EngineBackedSynthesizer {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self {
            engine,
            params: SamplingParams::default(),
        }
    }
}

#[async_trait]
impl ResponseSynthesizer for EngineBackedSynthesizer {
    fn kind(&self) -> &'static str {
        "engine"
    }

    async fn synthesize(&self, prompt: &ResolvedPrompt) -> Result<String, SynthesisError> {
        debug!(
            engine = self.engine.name(),
            history_len = prompt.history.len(),
            input_len = prompt.latest_user_input.len(),
            "delegating to inference engine"
        );
        let reply = self
            .engine
            .generate(
                &prompt.latest_user_input,
                &prompt.history,
                &prompt.system_prompt,
                &self.params,
            )
            .await?;
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// FallbackSynthesizer
// ---------------------------------------------------------------------------

/// Rule-based responder. Output depends only on the user input and the
/// clock reading.
#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    clock: Arc<dyn Clock>,
}

impl FallbackSynthesizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// The synchronous core of [`ResponseSynthesizer::synthesize`].
    pub fn respond(&self, user_input: &str) -> String {
        let input = user_input.to_lowercase();
        let template = fallback_rules::find_rule(&input)
            .map(|rule| rule.template)
            .unwrap_or(DEFAULT_TEMPLATE);

        if template.contains(DATE_PLACEHOLDER) {
            let date = self.clock.now().format(DATE_FORMAT).to_string();
            template.replace(DATE_PLACEHOLDER, &date)
        } else {
            template.to_string()
        }
    }
}

#[async_trait]
impl ResponseSynthesizer for FallbackSynthesizer {
    fn kind(&self) -> &'static str {
        "fallback"
    }

    async fn synthesize(&self, prompt: &ResolvedPrompt) -> Result<String, SynthesisError> {
        Ok(self.respond(&prompt.latest_user_input))
    }
}

// ---------------------------------------------------------------------------
// UnavailableNotice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableNotice;

#[async_trait]
impl ResponseSynthesizer for UnavailableNotice {
    fn kind(&self) -> &'static str {
        "notice"
    }

    async fn synthesize(&self, _prompt: &ResolvedPrompt) -> Result<String, SynthesisError> {
        Ok(MODEL_NOT_LOADED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::types::chat::Message;
    use crate::utilities::clock::FixedClock;
    use crate::utilities::errors::EngineError;

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::parse("2024-03-05T12:00:00+00:00").unwrap())
    }

    fn prompt(input: &str) -> ResolvedPrompt {
        ResolvedPrompt {
            system_prompt: "sys".into(),
            history: vec![Message::user("earlier"), Message::assistant("reply")],
            latest_user_input: input.into(),
        }
    }

    #[derive(Debug, Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<(String, usize, String, SamplingParams)>>,
    }

    #[async_trait]
    impl InferenceEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(
            &self,
            user_input: &str,
            history: &[Message],
            system_prompt: &str,
            params: &SamplingParams,
        ) -> Result<String, EngineError> {
            self.calls.lock().unwrap().push((
                user_input.to_string(),
                history.len(),
                system_prompt.to_string(),
                *params,
            ));
            Ok(format!("engine says: {user_input}"))
        }
    }

    #[derive(Debug)]
    struct FailingEngine;

    #[async_trait]
    impl InferenceEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(
            &self,
            _user_input: &str,
            _history: &[Message],
            _system_prompt: &str,
            _params: &SamplingParams,
        ) -> Result<String, EngineError> {
            Err(EngineError::rejected("CUDA out of memory"))
        }
    }

    #[tokio::test]
    async fn test_engine_backed_delegates_verbatim() {
        let engine = Arc::new(RecordingEngine::default());
        let synth = EngineBackedSynthesizer::new(engine.clone());

        let reply = assert_ok!(synth.synthesize(&prompt("what is love")).await);
        assert_eq!(reply, "engine says: what is love");

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (input, history_len, system, params) = &calls[0];
        assert_eq!(input, "what is love");
        assert_eq!(*history_len, 2);
        assert_eq!(system, "sys");
        assert_eq!(*params, SamplingParams::default());
    }

    #[tokio::test]
    async fn test_engine_backed_propagates_faults() {
        let synth = EngineBackedSynthesizer::new(Arc::new(FailingEngine));
        let err = assert_err!(synth.synthesize(&prompt("hi")).await);
        assert!(matches!(err, SynthesisError::Engine(_)));
        assert_eq!(err.to_string(), "CUDA out of memory");
    }

    #[test]
    fn test_fallback_greeting_includes_date() {
        let synth = FallbackSynthesizer::new(fixed_clock());
        assert_eq!(
            synth.respond("Hello there"),
            "Hello! I'm The Always Laughing Smile. How can I assist you today? Today is March 05, 2024."
        );
    }

    #[test]
    fn test_fallback_is_case_insensitive() {
        let synth = FallbackSynthesizer::new(fixed_clock());
        assert_eq!(synth.respond("TELL ME A JOKE"), synth.respond("tell me a joke"));
        assert!(synth.respond("Tell me a JOKE").starts_with("Why don't scientists trust atoms?"));
    }

    #[test]
    fn test_fallback_rules_in_table_order() {
        let synth = FallbackSynthesizer::new(fixed_clock());
        assert!(synth.respond("how are you").starts_with("I'm functioning perfectly well"));
        assert_eq!(
            synth.respond("what time is it"),
            "Today is March 05, 2024. How may I assist you further?"
        );
        assert!(synth.respond("can you help me").starts_with("I'm here to help!"));
        assert!(synth.respond("thanks a lot").starts_with("You're very welcome!"));
        assert!(synth.respond("goodbye").starts_with("Goodbye!"));
        assert!(synth.respond("who are you").starts_with("I am 'The Always Laughing Smile'"));
        assert!(synth.respond("the weather").starts_with("I don't have real-time access"));
        assert!(synth
            .respond("the meaning of life")
            .starts_with("The meaning of life is a profound"));
    }

    #[test]
    fn test_fallback_default_asks_to_elaborate() {
        let synth = FallbackSynthesizer::new(fixed_clock());
        let reply = synth.respond("");
        assert!(reply.contains("Could you please elaborate"));
        assert!(reply.ends_with("Today is March 05, 2024."));
    }

    #[test]
    fn test_fallback_is_pure_for_fixed_clock() {
        let a = FallbackSynthesizer::new(fixed_clock());
        let b = FallbackSynthesizer::new(fixed_clock());
        for input in ["hello", "random words", "what's the date", ""] {
            assert_eq!(a.respond(input), b.respond(input));
        }
    }

    #[test]
    fn test_fallback_date_follows_clock() {
        let later: Arc<dyn Clock> =
            Arc::new(FixedClock::parse("2025-12-31T08:00:00+00:00").unwrap());
        let synth = FallbackSynthesizer::new(later);
        assert!(synth.respond("date please").contains("December 31, 2025"));
    }

    #[tokio::test]
    async fn test_fallback_synthesize_uses_latest_input_only() {
        let synth = FallbackSynthesizer::new(fixed_clock());
        let reply = assert_ok!(synth.synthesize(&prompt("goodbye")).await);
        assert!(reply.starts_with("Goodbye!"));
    }

    #[tokio::test]
    async fn test_unavailable_notice() {
        let reply = assert_ok!(UnavailableNotice.synthesize(&prompt("hello")).await);
        assert_eq!(reply, MODEL_NOT_LOADED);
    }
}
