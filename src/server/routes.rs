//! Axum route handlers for the TypeAI HTTP server.
//!
//! # Routes
//!
//! - `GET  /`                — Health snapshot `{status, message, model_loaded, timestamp}`
//! - `POST /api/chat`        — `ChatRequest` → one `ReplyEnvelope`
//! - `POST /api/chat/stream` — `ChatRequest` → Server-Sent Events, one
//!   JSON `ReplyEnvelope` per `data:` line
//!
//! Streaming is selected by path; the `stream` field of the body is ignored.
//! Both chat routes answer 200 with an envelope even when the body cannot be
//! decoded: the failure is reported as the reply content.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::chat::session::{ChatReply, ChatSession, DeliveryMode};
use crate::types::chat::{ChatRequest, HealthResponse};

/// Shared application state for the HTTP server.
#[derive(Clone, Debug)]
pub struct AppState {
    pub session: Arc<ChatSession>,
}

impl AppState {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", post(chat_stream_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET / — health snapshot.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.session.health())
}

/// POST /api/chat — single reply.
async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ChatReply {
    reply(&state, payload, DeliveryMode::Direct).await
}

/// POST /api/chat/stream — reply as an event stream of frames in the
/// configured `FrameMode`.
async fn chat_stream_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ChatReply {
    reply(&state, payload, DeliveryMode::Streamed).await
}

async fn reply(
    state: &AppState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
    mode: DeliveryMode,
) -> ChatReply {
    match payload {
        Ok(Json(request)) => state.session.respond(&request, mode).await,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), ?mode, "undecodable chat request");
            state.session.failure_reply(rejection.body_text(), mode)
        }
    }
}

impl IntoResponse for ChatReply {
    fn into_response(self) -> Response {
        match self {
            ChatReply::Direct(envelope) => Json(envelope).into_response(),
            ChatReply::Streamed(frames) => {
                let events = frames.map(|frame| Event::default().json_data(frame));
                Sse::new(events)
                    .keep_alive(KeepAlive::default())
                    .into_response()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
