//! Route configuration.
//!
//! # Endpoints
//!
//! - `GET /` - browser client page
//! - `GET /static/*` - static assets
//! - `GET /ws` - WebSocket upgrade for the transcription relay
//!
//! # Protocol
//!
//! After upgrade the client sends raw binary PCM frames (16 kHz, mono,
//! 16-bit LE). The server responds with JSON transcript events:
//!
//! ```json
//! {"text": "hello world", "is_final": false}
//! ```

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::handlers::ws_relay_handler;
use crate::state::AppState;

/// Create the relay router: static surface plus the WebSocket endpoint.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_relay_handler))
        .route_service("/", ServeFile::new("static/index.html"))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
