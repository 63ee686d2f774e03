//! WebSocket relay handler.
//!
//! Upgrades `GET /ws`, opens an Amazon Transcribe streaming session, and runs
//! the duplex relay between the two: client→server binary messages are PCM
//! frames (16 kHz mono 16-bit LE), server→client messages are JSON transcript
//! events.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::core::stt::aws_transcribe::start_session;
use crate::core::stt::TranscriptEvent;
use crate::relay::{FrameSource, SinkClosed, TranscriptSink, run_relay};
use crate::state::AppState;

/// Maximum WebSocket message size (1 MB). Audio frames are ~100 ms of PCM,
/// a few KB; anything near this limit is not audio.
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Transcript event as sent to the client.
#[derive(Debug, Serialize)]
struct TranscriptMessage {
    text: String,
    is_final: bool,
}

impl From<TranscriptEvent> for TranscriptMessage {
    fn from(event: TranscriptEvent) -> Self {
        Self {
            text: event.text,
            is_final: event.is_final,
        }
    }
}

/// WebSocket relay handler.
///
/// Upgrades the HTTP connection and hands the socket to the relay session.
pub async fn ws_relay_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run one relay session over a connected WebSocket.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = uuid::Uuid::new_v4();
    info!(%session_id, "WebSocket client connected");

    let (input, events) = match start_session(&state.config.transcribe()).await {
        Ok(halves) => halves,
        Err(e) => {
            error!(%session_id, "Failed to start transcription session: {}", e);
            return;
        }
    };

    let (sender, receiver) = socket.split();
    run_relay(
        SocketFrameSource { receiver },
        input,
        events,
        SocketTranscriptSink { sender },
    )
    .await;

    info!(%session_id, "WebSocket session closed");
}

// =============================================================================
// Socket Adapters
// =============================================================================

/// Frame source over the receiving half of a client WebSocket.
///
/// Each binary message is one frame. A closed or errored socket ends the
/// sequence; non-binary messages are skipped.
struct SocketFrameSource {
    receiver: SplitStream<WebSocket>,
}

#[async_trait]
impl FrameSource for SocketFrameSource {
    async fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            match self.receiver.next().await {
                Some(Ok(Message::Binary(data))) => return Some(data),
                Some(Ok(Message::Close(_))) => {
                    debug!("WebSocket close received");
                    return None;
                }
                Some(Ok(other)) => {
                    debug!("Ignoring non-audio WebSocket message: {:?}", other);
                }
                Some(Err(e)) => {
                    // Peer gone; end the sequence quietly.
                    warn!("WebSocket receive error: {}", e);
                    return None;
                }
                None => return None,
            }
        }
    }
}

/// Transcript sink over the sending half of a client WebSocket.
struct SocketTranscriptSink {
    sender: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl TranscriptSink for SocketTranscriptSink {
    async fn forward(&mut self, event: TranscriptEvent) -> Result<(), SinkClosed> {
        let json = serde_json::to_string(&TranscriptMessage::from(event))
            .map_err(|_| SinkClosed)?;
        self.sender
            .send(Message::Text(json.into()))
            .await
            .map_err(|_| SinkClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_message_wire_shape() {
        let mut event = TranscriptEvent::new("hello", true);
        event.result_id = Some("seg-1".to_string());

        // The wire format carries exactly text and is_final.
        let json = serde_json::to_string(&TranscriptMessage::from(event)).unwrap();
        assert_eq!(json, r#"{"text":"hello","is_final":true}"#);
    }
}
