//! Relay configuration.
//!
//! Loaded from environment variables (with `.env` support via dotenvy in
//! `main`), falling back to defaults. Priority: ENV vars > .env values >
//! defaults.
//!
//! | Variable        | Default     |
//! |-----------------|-------------|
//! | `HOST`          | `0.0.0.0`   |
//! | `PORT`          | `8000`      |
//! | `AWS_REGION`    | `us-west-2` |
//! | `LANGUAGE_CODE` | `en-US`     |
//! | `SAMPLE_RATE`   | `16000`     |

use thiserror::Error;

use crate::core::stt::SttError;
use crate::core::stt::aws_transcribe::{
    AwsRegion, DEFAULT_LANGUAGE, DEFAULT_SAMPLE_RATE, TranscribeConfig,
};

/// Default bind host.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
const DEFAULT_PORT: u16 = 8000;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error(transparent)]
    Stt(#[from] SttError),
}

/// Server and session configuration for the relay.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bind host for the WebSocket server.
    pub host: String,
    /// Bind port for the WebSocket server.
    pub port: u16,
    /// AWS region for the Transcribe streaming endpoint.
    pub region: AwsRegion,
    /// Language code for transcription.
    pub language: String,
    /// PCM sample rate in Hz. Session-level constant; frames carry no
    /// per-frame format metadata.
    pub sample_rate_hz: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            region: AwsRegion::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables, validating the result.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => defaults.port,
        };
        let region = std::env::var("AWS_REGION")
            .map(|r| AwsRegion::from_str_or_default(&r))
            .unwrap_or(defaults.region);
        let language = std::env::var("LANGUAGE_CODE").unwrap_or(defaults.language);
        let sample_rate_hz = match std::env::var("SAMPLE_RATE") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "SAMPLE_RATE",
                value: raw,
            })?,
            Err(_) => defaults.sample_rate_hz,
        };

        let config = Self {
            host,
            port,
            region,
            language,
            sample_rate_hz,
        };
        config.transcribe().validate()?;
        Ok(config)
    }

    /// Bind address string (`host:port`).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Transcribe session configuration derived from this config.
    pub fn transcribe(&self) -> TranscribeConfig {
        TranscribeConfig {
            region: self.region,
            language: self.language.clone(),
            sample_rate_hz: self.sample_rate_hz,
        }
    }
}
