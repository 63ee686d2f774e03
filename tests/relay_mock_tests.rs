//! End-to-end relay tests over mock endpoints.
//!
//! These exercise the public relay API the way a real session uses it: a
//! frame source on one side, a recognition session and transcript sink on
//! the other, with the finality classifier in the event path.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use transcribe_relay::core::stt::{RawTranscriptResult, SttError, TranscriptEvent};
use transcribe_relay::relay::{
    FrameSource, SessionEvents, SessionInput, SinkClosed, TranscriptSink, run_relay,
};

// =============================================================================
// Mock Endpoints
// =============================================================================

/// Frame source fed from a channel, like a live socket.
struct ChannelSource {
    rx: mpsc::Receiver<Bytes>,
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn next_frame(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BackendCall {
    SendAudio(Vec<u8>),
    EndStream,
}

/// Mock recognition backend. The input half records calls; once the stream
/// is ended it releases the scripted events, mimicking a backend that closes
/// its result stream after the audio ends.
#[derive(Clone)]
struct MockBackend {
    calls: Arc<Mutex<Vec<BackendCall>>>,
    script: Arc<Mutex<VecDeque<Result<TranscriptEvent, SttError>>>>,
    ended: Arc<tokio::sync::Notify>,
}

impl MockBackend {
    fn new(script: Vec<Result<TranscriptEvent, SttError>>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(script.into())),
            ended: Arc::new(tokio::sync::Notify::new()),
        }
    }

    fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionInput for MockBackend {
    async fn send_audio(&mut self, frame: Bytes) -> Result<(), SttError> {
        self.calls
            .lock()
            .unwrap()
            .push(BackendCall::SendAudio(frame.to_vec()));
        Ok(())
    }

    async fn end_stream(&mut self) -> Result<(), SttError> {
        self.calls.lock().unwrap().push(BackendCall::EndStream);
        // notify_one stores a permit, so the event side cannot miss the
        // signal even if the pump finishes before it starts waiting.
        self.ended.notify_one();
        Ok(())
    }
}

/// Event half that yields the script only after the audio stream ended.
struct MockEvents {
    backend: MockBackend,
    released: bool,
}

impl MockEvents {
    fn new(backend: &MockBackend) -> Self {
        Self {
            backend: backend.clone(),
            released: false,
        }
    }
}

#[async_trait]
impl SessionEvents for MockEvents {
    async fn next_event(&mut self) -> Option<Result<TranscriptEvent, SttError>> {
        if !self.released {
            self.backend.ended.notified().await;
            self.released = true;
        }
        self.backend.script.lock().unwrap().pop_front()
    }
}

#[derive(Clone)]
struct RecordingSink {
    received: Arc<Mutex<Vec<TranscriptEvent>>>,
    closed: Arc<Mutex<bool>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
        }
    }

    fn received(&self) -> Vec<TranscriptEvent> {
        self.received.lock().unwrap().clone()
    }

    fn disconnect(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

#[async_trait]
impl TranscriptSink for RecordingSink {
    async fn forward(&mut self, event: TranscriptEvent) -> Result<(), SinkClosed> {
        if *self.closed.lock().unwrap() {
            return Err(SinkClosed);
        }
        self.received.lock().unwrap().push(event);
        Ok(())
    }
}

fn event(raw: RawTranscriptResult) -> Result<TranscriptEvent, SttError> {
    Ok(raw.into())
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn full_session_relays_frames_then_transcripts() {
    let backend = MockBackend::new(vec![
        event(RawTranscriptResult {
            transcript: "hel".to_string(),
            is_partial: Some(true),
            ..Default::default()
        }),
        event(RawTranscriptResult {
            transcript: "hello".to_string(),
            is_partial: Some(false),
            ..Default::default()
        }),
    ]);
    let events = MockEvents::new(&backend);
    let sink = RecordingSink::new();

    let (tx, rx) = mpsc::channel(8);
    for frame in [&b"F1"[..], b"F2", b"F3"] {
        tx.send(Bytes::copy_from_slice(frame)).await.unwrap();
    }
    drop(tx); // end the source

    run_relay(ChannelSource { rx }, backend.clone(), events, sink.clone()).await;

    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::SendAudio(b"F1".to_vec()),
            BackendCall::SendAudio(b"F2".to_vec()),
            BackendCall::SendAudio(b"F3".to_vec()),
            BackendCall::EndStream,
        ]
    );
    assert_eq!(
        sink.received(),
        vec![
            TranscriptEvent::new("hel", false),
            TranscriptEvent::new("hello", true),
        ]
    );
}

#[tokio::test]
async fn result_type_schema_variant_classifies_via_fallback() {
    let backend = MockBackend::new(vec![
        event(RawTranscriptResult {
            transcript: "hi".to_string(),
            result_type: Some("PARTIAL".to_string()),
            ..Default::default()
        }),
        event(RawTranscriptResult {
            transcript: "hi there".to_string(),
            result_type: Some("FINAL".to_string()),
            ..Default::default()
        }),
    ]);
    let events = MockEvents::new(&backend);
    let sink = RecordingSink::new();

    let (tx, rx) = mpsc::channel(1);
    drop(tx);

    run_relay(ChannelSource { rx }, backend, events, sink.clone()).await;

    assert_eq!(
        sink.received(),
        vec![
            TranscriptEvent::new("hi", false),
            TranscriptEvent::new("hi there", true),
        ]
    );
}

#[tokio::test]
async fn unclassifiable_events_default_to_non_final() {
    let backend = MockBackend::new(vec![event(RawTranscriptResult {
        transcript: "mystery".to_string(),
        ..Default::default()
    })]);
    let events = MockEvents::new(&backend);
    let sink = RecordingSink::new();

    let (tx, rx) = mpsc::channel(1);
    drop(tx);

    run_relay(ChannelSource { rx }, backend, events, sink.clone()).await;

    assert_eq!(sink.received(), vec![TranscriptEvent::new("mystery", false)]);
}

#[tokio::test]
async fn sink_disconnect_mid_session_still_closes_backend_cleanly() {
    let backend = MockBackend::new(vec![
        event(RawTranscriptResult {
            transcript: "one".to_string(),
            is_partial: Some(true),
            ..Default::default()
        }),
        event(RawTranscriptResult {
            transcript: "two".to_string(),
            is_partial: Some(false),
            ..Default::default()
        }),
    ]);
    let events = MockEvents::new(&backend);
    let sink = RecordingSink::new();
    sink.disconnect(); // peer gone before any event arrives

    let (tx, rx) = mpsc::channel(8);
    tx.send(Bytes::from_static(b"F1")).await.unwrap();
    tx.send(Bytes::from_static(b"F2")).await.unwrap();
    drop(tx);

    run_relay(ChannelSource { rx }, backend.clone(), events, sink.clone()).await;

    // All frames still reached the backend, followed by exactly one
    // end_stream; the dead sink received nothing.
    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::SendAudio(b"F1".to_vec()),
            BackendCall::SendAudio(b"F2".to_vec()),
            BackendCall::EndStream,
        ]
    );
    assert!(sink.received().is_empty());
}

#[tokio::test]
async fn backend_stream_error_ends_session_without_panic() {
    let backend = MockBackend::new(vec![Err(SttError::Stream(
        "stream rejected".to_string(),
    ))]);
    let events = MockEvents::new(&backend);
    let sink = RecordingSink::new();

    let (tx, rx) = mpsc::channel(1);
    drop(tx);

    run_relay(ChannelSource { rx }, backend.clone(), events, sink.clone()).await;

    assert_eq!(backend.calls(), vec![BackendCall::EndStream]);
    assert!(sink.received().is_empty());
}
