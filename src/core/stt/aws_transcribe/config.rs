//! Configuration types for the Amazon Transcribe streaming session.
//!
//! Audio requirements for PCM streaming:
//! - 16-bit signed little-endian, mono
//! - Sample rate: 8,000 Hz to 48,000 Hz (16,000 Hz recommended)

use serde::{Deserialize, Serialize};

use crate::core::stt::base::SttError;

/// Minimum supported sample rate in Hz.
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Maximum supported sample rate in Hz.
pub const MAX_SAMPLE_RATE: u32 = 48_000;

/// Default sample rate in Hz (what the browser client and mic capture use).
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Default language code for transcription.
pub const DEFAULT_LANGUAGE: &str = "en-US";

// =============================================================================
// AWS Regions
// =============================================================================

/// AWS regions where Amazon Transcribe Streaming is available.
///
/// Select the region closest to your users for lowest latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AwsRegion {
    /// US East (N. Virginia)
    #[serde(rename = "us-east-1")]
    UsEast1,
    /// US East (Ohio)
    #[serde(rename = "us-east-2")]
    UsEast2,
    /// US West (Oregon)
    #[default]
    #[serde(rename = "us-west-2")]
    UsWest2,
    /// Asia Pacific (Singapore)
    #[serde(rename = "ap-southeast-1")]
    ApSoutheast1,
    /// Asia Pacific (Sydney)
    #[serde(rename = "ap-southeast-2")]
    ApSoutheast2,
    /// Asia Pacific (Tokyo)
    #[serde(rename = "ap-northeast-1")]
    ApNortheast1,
    /// Canada (Central)
    #[serde(rename = "ca-central-1")]
    CaCentral1,
    /// Europe (Frankfurt)
    #[serde(rename = "eu-central-1")]
    EuCentral1,
    /// Europe (Ireland)
    #[serde(rename = "eu-west-1")]
    EuWest1,
    /// Europe (London)
    #[serde(rename = "eu-west-2")]
    EuWest2,
    /// South America (Sao Paulo)
    #[serde(rename = "sa-east-1")]
    SaEast1,
}

impl AwsRegion {
    /// Convert to the AWS region string.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsEast1 => "us-east-1",
            Self::UsEast2 => "us-east-2",
            Self::UsWest2 => "us-west-2",
            Self::ApSoutheast1 => "ap-southeast-1",
            Self::ApSoutheast2 => "ap-southeast-2",
            Self::ApNortheast1 => "ap-northeast-1",
            Self::CaCentral1 => "ca-central-1",
            Self::EuCentral1 => "eu-central-1",
            Self::EuWest1 => "eu-west-1",
            Self::EuWest2 => "eu-west-2",
            Self::SaEast1 => "sa-east-1",
        }
    }

    /// Parse from string, with fallback to the default (us-west-2).
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "us-east-1" => Self::UsEast1,
            "us-east-2" => Self::UsEast2,
            "us-west-2" => Self::UsWest2,
            "ap-southeast-1" => Self::ApSoutheast1,
            "ap-southeast-2" => Self::ApSoutheast2,
            "ap-northeast-1" => Self::ApNortheast1,
            "ca-central-1" => Self::CaCentral1,
            "eu-central-1" => Self::EuCentral1,
            "eu-west-1" => Self::EuWest1,
            "eu-west-2" => Self::EuWest2,
            "sa-east-1" => Self::SaEast1,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Configuration for one Amazon Transcribe streaming session.
///
/// Credentials come from the default AWS credential chain (environment
/// variables, profile, IAM role); only the region is configured here.
#[derive(Debug, Clone)]
pub struct TranscribeConfig {
    /// AWS region the streaming endpoint lives in.
    pub region: AwsRegion,
    /// Language code for transcription (e.g. "en-US").
    pub language: String,
    /// PCM sample rate in Hz.
    pub sample_rate_hz: u32,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            region: AwsRegion::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl TranscribeConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SttError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate_hz) {
            return Err(SttError::Configuration(format!(
                "sample rate must be between {} and {} Hz, got {}",
                MIN_SAMPLE_RATE, MAX_SAMPLE_RATE, self.sample_rate_hz
            )));
        }
        if self.language.trim().is_empty() {
            return Err(SttError::Configuration(
                "language code must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
