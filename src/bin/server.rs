//! TypeAI backend HTTP server binary.
//!
//! Starts an axum HTTP server exposing the chat endpoints. If an inference
//! engine is configured and answers at startup, replies come from it;
//! otherwise the server runs in fallback mode.
//!
//! # Environment Variables
//!
//! - `PORT` / `TYPEAI_HOST` — Bind address (default: `0.0.0.0:3000`)
//! - `TYPEAI_ENGINE_URL` — OpenAI-compatible engine base URL (unset: fallback mode)
//! - `TYPEAI_ENGINE_MODEL`, `TYPEAI_ENGINE_API_KEY`, `TYPEAI_ENGINE_TIMEOUT_SECS`
//! - `TYPEAI_SYSTEM_PROMPT` — Prompt used when a request has no system message
//! - `TYPEAI_SYNTHESIS_TIMEOUT_SECS` — Bound on one reply, `0` disables (default: 180)
//! - `TYPEAI_FALLBACK` — `rules` or `notice` when no engine is loaded (default: `rules`)
//! - `TYPEAI_STREAM_PACING_MS`, `TYPEAI_STREAM_CHUNK_WORDS`, `TYPEAI_STREAM_MODE`
//! - `TYPEAI_STREAM_BUDGET_SECS` — Wall-clock budget of one stream (default: 60)
//! - `RUST_LOG` / `TYPEAI_LOG` — Tracing filter (default: "info,typeai=debug")
//! - `TYPEAI_LOG_JSON` — Emit JSON log lines
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! TYPEAI_ENGINE_URL=http://127.0.0.1:8000/v1 cargo run --bin server
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use typeai::server::{app_router, build_state, ServerConfig};
use typeai::utilities::clock::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ServerConfig::from_env();

    // Initialize tracing
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: TYPEAI_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = typeai::VERSION, "typeai server starting");

    let state = build_state(&cfg, Arc::new(SystemClock)).await;
    let model_loaded = state.session.model_loaded();
    let app = app_router(state);

    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, model_loaded, "HTTP server listening");
    info!("Endpoints:");
    info!("  GET  /                — health snapshot");
    info!("  POST /api/chat        — chat reply");
    info!("  POST /api/chat/stream — streamed chat reply (text/event-stream)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("typeai server stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
