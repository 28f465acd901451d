//! HTTP server for the TypeAI chat backend.
//!
//! # Endpoints
//!
//! - `GET  /`                — Health snapshot
//! - `POST /api/chat`        — Single chat reply
//! - `POST /api/chat/stream` — Chat reply as a Server-Sent Events stream

pub mod config;
pub mod routes;
pub mod startup;

pub use config::ServerConfig;
pub use routes::{app_router, AppState};
pub use startup::{build_state, resolve_engine_state};
