//! HTTP and WebSocket request handlers.
//!
//! - `ws` - WebSocket relay endpoint (audio in, transcripts out)

pub mod ws;

pub use ws::ws_relay_handler;
