//! Duplex relay between an audio frame source and a streaming recognizer.
//!
//! One relay serves one session: an inbound pump reads frames from a
//! [`FrameSource`] and feeds them to the session's [`SessionInput`], while an
//! outbound drain reads [`TranscriptEvent`]s from [`SessionEvents`] and
//! forwards them to a [`TranscriptSink`]. Both run concurrently on the same
//! task and the relay completes only when both have terminated.
//!
//! Lifecycle guarantees:
//! - Frames reach the session in source order; events reach the sink in
//!   backend order. No batching, no reordering.
//! - `end_stream` is called exactly once when the source ends, whether by
//!   exhaustion or by a send failure. The backend then closes its event
//!   stream, which ends the drain.
//! - A sink failure (peer gone) ends the drain only; the pump keeps sending
//!   until its own source ends, so the backend session is never leaked.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::core::stt::{SttError, TranscriptEvent};

// =============================================================================
// Seams
// =============================================================================

/// A lazy, potentially infinite sequence of PCM audio frames.
///
/// `None` ends the sequence: source exhaustion, peer disconnect, and
/// cancellation all look the same to the relay.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Option<Bytes>;
}

/// Audio-sending half of a recognition session.
#[async_trait]
pub trait SessionInput: Send {
    async fn send_audio(&mut self, frame: Bytes) -> Result<(), SttError>;

    /// Signal that no further audio is coming. Must be safe to call more
    /// than once; the relay calls it exactly once per session.
    async fn end_stream(&mut self) -> Result<(), SttError>;
}

/// Event-yielding half of a recognition session.
///
/// `None` means the backend closed the stream; `Some(Err(_))` is a backend
/// failure that ends the session.
#[async_trait]
pub trait SessionEvents: Send {
    async fn next_event(&mut self) -> Option<Result<TranscriptEvent, SttError>>;
}

/// Destination for transcript events (socket send, stdout print).
///
/// There is exactly one handling strategy per session, so this is a
/// single-method seam rather than a handler hierarchy.
#[async_trait]
pub trait TranscriptSink: Send {
    /// Forward one event. An error means the peer is gone and ends the
    /// drain; it is never escalated to the pump.
    async fn forward(&mut self, event: TranscriptEvent) -> Result<(), SinkClosed>;
}

/// The sink's peer disconnected. Expected and non-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

impl std::fmt::Display for SinkClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("transcript sink closed")
    }
}

impl std::error::Error for SinkClosed {}

// =============================================================================
// Relay
// =============================================================================

/// Run one relay session to completion.
///
/// Completes when both the inbound pump and the outbound drain have
/// terminated. Neither direction's failure aborts the other, except through
/// the natural consequence of the backend closing the shared stream.
pub async fn run_relay<S, I, E, K>(source: S, input: I, events: E, sink: K)
where
    S: FrameSource,
    I: SessionInput,
    E: SessionEvents,
    K: TranscriptSink,
{
    tokio::join!(pump_audio(source, input), drain_events(events, sink));
}

/// Inbound pump: source frames into the session, then end the stream.
async fn pump_audio<S, I>(mut source: S, mut input: I)
where
    S: FrameSource,
    I: SessionInput,
{
    while let Some(frame) = source.next_frame().await {
        if let Err(e) = input.send_audio(frame).await {
            warn!("Audio send failed, ending stream: {}", e);
            break;
        }
    }

    if let Err(e) = input.end_stream().await {
        debug!("end_stream after source ended: {}", e);
    }
}

/// Outbound drain: session events into the sink until either side ends.
async fn drain_events<E, K>(mut events: E, mut sink: K)
where
    E: SessionEvents,
    K: TranscriptSink,
{
    while let Some(result) = events.next_event().await {
        match result {
            Ok(event) => {
                if sink.forward(event).await.is_err() {
                    // Peer gone. Shut down this direction quietly; the pump
                    // still finishes and closes the backend stream.
                    debug!("Transcript sink closed, ending drain");
                    return;
                }
            }
            Err(e) => {
                warn!("Recognition stream failed: {}", e);
                return;
            }
        }
    }
    debug!("Recognition stream ended");
}
