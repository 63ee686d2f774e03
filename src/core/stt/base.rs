//! Core speech-to-text types shared across the relay.
//!
//! Defines the transcript event record the relay forwards to clients, the
//! provider-neutral raw result shape, and the error taxonomy for the
//! recognition session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Transcript Events
// =============================================================================

/// One recognition result for an utterance segment, partial or final.
///
/// Non-final events are incrementally-updated hypotheses for the same
/// in-progress segment and are superseded by later events carrying the same
/// `result_id`. A final event will not be revised further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// Transcribed text for the segment.
    pub text: String,
    /// Whether this segment is terminal and will not be revised.
    pub is_final: bool,
    /// Segment identifier, when the backend provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
}

impl TranscriptEvent {
    /// Create a transcript event without a segment identifier.
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            text: text.into(),
            is_final,
            result_id: None,
        }
    }
}

// =============================================================================
// Finality Classification
// =============================================================================

/// Sentinel value in the `result_type` field that marks a final result.
const RESULT_TYPE_FINAL: &str = "FINAL";

/// A recognition result as the backend exposes it, before classification.
///
/// Backends have shipped the final/partial flag in two shapes across schema
/// versions: a boolean partial flag, or a string result type equal to a
/// sentinel. Both fields are optional here so the classifier can probe them
/// in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTranscriptResult {
    /// Transcribed text of the best alternative.
    pub transcript: String,
    /// Boolean partial flag, when the schema exposes one.
    pub is_partial: Option<bool>,
    /// String result type (e.g. "PARTIAL" / "FINAL"), when the schema
    /// exposes one.
    pub result_type: Option<String>,
    /// Segment identifier, when present.
    pub result_id: Option<String>,
}

/// Derive finality from a raw result, whatever schema shape it uses.
///
/// Probes the partial flag first (invert to get finality); falls back to the
/// `result_type` sentinel; defaults to non-final when neither is present.
/// Nothing outside this function inspects raw event shapes.
pub fn classify_finality(result: &RawTranscriptResult) -> bool {
    match result.is_partial {
        Some(partial) => !partial,
        None => result
            .result_type
            .as_deref()
            .map(|t| t == RESULT_TYPE_FINAL)
            .unwrap_or(false),
    }
}

impl From<RawTranscriptResult> for TranscriptEvent {
    fn from(raw: RawTranscriptResult) -> Self {
        let is_final = classify_finality(&raw);
        Self {
            text: raw.transcript,
            is_final,
            result_id: raw.result_id,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by a recognition session.
///
/// Peer disconnects (socket closed, device stopped) are not represented
/// here: they end the affected relay direction silently. These variants
/// cover the backend session itself, which ends the session when it fails.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// Invalid configuration (bad sample rate, empty language code, ...).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The streaming session could not be established.
    #[error("failed to start transcription stream: {0}")]
    Connection(String),

    /// The established stream failed mid-session.
    #[error("transcription stream error: {0}")]
    Stream(String),

    /// The audio channel to the session closed before `end_stream`.
    #[error("audio channel closed: {0}")]
    ChannelClosed(String),
}
