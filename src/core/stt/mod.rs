pub mod aws_transcribe;
mod base;

// Re-export public types
pub use base::{RawTranscriptResult, SttError, TranscriptEvent, classify_finality};

pub use aws_transcribe::{AwsRegion, TranscribeConfig, TranscribeEvents, TranscribeInput};
