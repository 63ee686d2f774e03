//! Amazon Transcribe Streaming backend session.

mod client;
mod config;

pub use client::{TranscribeEvents, TranscribeInput, start_session};
pub use config::{
    AwsRegion, DEFAULT_LANGUAGE, DEFAULT_SAMPLE_RATE, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE,
    TranscribeConfig,
};
