//! Router configuration for the chat server.

use axum::{routing::get, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::chat::Relay;

use super::ws::{chat_ws_handler, ChatWsState};

/// Main page served for every unmatched path.
pub const INDEX_FILE: &str = "index.html";

/// Create the main router.
///
/// - `/ws` upgrades to the chat WebSocket
/// - `/health` answers liveness checks
/// - everything else is served from `static_path`, falling back to the main page
pub fn create_router(relay: Arc<Relay>, static_path: &str) -> Router {
    let ws_state = Arc::new(ChatWsState::new(relay));

    Router::new()
        .route("/ws", get(chat_ws_handler))
        .with_state(ws_state)
        .merge(create_health_router())
        .fallback_service(create_static_service(static_path))
        .layer(TraceLayer::new_for_http())
}

/// Static file service with main-page fallback.
pub fn create_static_service(static_path: &str) -> ServeDir<ServeFile> {
    let index = Path::new(static_path).join(INDEX_FILE);
    ServeDir::new(static_path).fallback(ServeFile::new(index))
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
