//! Startup wiring: decide engine availability once and build shared state.

use std::sync::Arc;

use tracing::{info, warn};

use super::config::ServerConfig;
use super::routes::AppState;
use crate::chat::session::ChatSession;
use crate::llms::engine::EngineState;
use crate::llms::providers::openai_compatible::{EngineConfig, OpenAiCompatibleEngine};
use crate::utilities::clock::Clock;

/// Connect to the configured engine, if any.
///
/// The server keeps running without a model: any failure here is logged
/// and yields [`EngineState::Unavailable`].
pub async fn resolve_engine_state(config: Option<&EngineConfig>) -> EngineState {
    let Some(config) = config else {
        info!("no inference engine configured; running in fallback mode");
        return EngineState::Unavailable;
    };

    let engine = match OpenAiCompatibleEngine::new(config.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            warn!(error = %e, "failed to build inference engine client");
            return EngineState::Unavailable;
        }
    };

    match engine.probe().await {
        Ok(()) => {
            info!(base_url = %config.base_url, model = %config.model, "inference engine ready");
            EngineState::ready(engine)
        }
        Err(e) => {
            warn!(
                base_url = %config.base_url,
                error = %e,
                "inference engine unavailable; running in fallback mode"
            );
            EngineState::Unavailable
        }
    }
}

/// Build the application state for `config`.
pub async fn build_state(config: &ServerConfig, clock: Arc<dyn Clock>) -> AppState {
    let engine_state = resolve_engine_state(config.engine.as_ref()).await;
    let session = ChatSession::new(engine_state, config.session.clone(), clock);
    AppState::new(session)
}
