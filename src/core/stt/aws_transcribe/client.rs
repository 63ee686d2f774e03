//! Amazon Transcribe Streaming session.
//!
//! Starts one streaming transcription RPC and splits it into the relay's two
//! session halves: [`TranscribeInput`] feeds PCM frames into the request's
//! audio event stream, [`TranscribeEvents`] yields classified
//! [`TranscriptEvent`]s from the result stream.

use async_trait::async_trait;
use bytes::Bytes;

use aws_config::BehaviorVersion;
use aws_sdk_transcribestreaming::Client as TranscribeClient;
use aws_sdk_transcribestreaming::types::{
    AudioEvent, AudioStream, LanguageCode, MediaEncoding, TranscriptResultStream,
};
use aws_smithy_types::Blob;
use tokio::sync::mpsc;

use super::config::TranscribeConfig;
use crate::core::stt::base::{RawTranscriptResult, SttError, TranscriptEvent};
use crate::relay::{SessionEvents, SessionInput};

use tracing::{debug, error, info, warn};

/// Channel buffer size for audio frames awaiting the SDK stream.
const AUDIO_CHANNEL_BUFFER_SIZE: usize = 32;

/// Convert a language code string to the SDK enum.
///
/// Unsupported codes fall back to en-US with a warning rather than failing
/// the session.
fn convert_language_code(language: &str) -> LanguageCode {
    match language.to_lowercase().as_str() {
        "en-us" | "en_us" => LanguageCode::EnUs,
        "en-gb" | "en_gb" => LanguageCode::EnGb,
        "en-au" | "en_au" => LanguageCode::EnAu,
        "es-us" | "es_us" => LanguageCode::EsUs,
        "fr-fr" | "fr_fr" => LanguageCode::FrFr,
        "fr-ca" | "fr_ca" => LanguageCode::FrCa,
        "de-de" | "de_de" => LanguageCode::DeDe,
        "it-it" | "it_it" => LanguageCode::ItIt,
        "pt-br" | "pt_br" => LanguageCode::PtBr,
        "ja-jp" | "ja_jp" => LanguageCode::JaJp,
        "ko-kr" | "ko_kr" => LanguageCode::KoKr,
        "zh-cn" | "zh_cn" => LanguageCode::ZhCn,
        "hi-in" | "hi_in" => LanguageCode::HiIn,
        _ => {
            warn!(
                "Unsupported language code '{}', defaulting to en-US",
                language
            );
            LanguageCode::EnUs
        }
    }
}

/// Start a streaming transcription session.
///
/// Returns the two session halves. The audio side of the RPC is fed from a
/// bounded channel and ends when [`TranscribeInput::end_stream`] drops the
/// sender; the backend then closes the result stream, which ends
/// [`TranscribeEvents`].
pub async fn start_session(
    config: &TranscribeConfig,
) -> Result<(TranscribeInput, TranscribeEvents), SttError> {
    config.validate()?;

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.as_str()))
        .load()
        .await;
    let client = TranscribeClient::new(&aws_config);

    let (audio_tx, mut audio_rx) = mpsc::channel::<Bytes>(AUDIO_CHANNEL_BUFFER_SIZE);

    // Audio event stream for the request, fed from the channel. Ends when
    // every sender is dropped, which is how end_stream closes the RPC.
    let audio_stream = async_stream::stream! {
        while let Some(frame) = audio_rx.recv().await {
            // Blob requires an owned Vec, so one copy is unavoidable here.
            let audio_event = AudioEvent::builder()
                .audio_chunk(Blob::new(frame.to_vec()))
                .build();
            yield Ok(AudioStream::AudioEvent(audio_event));
        }
    };

    let output = client
        .start_stream_transcription()
        .language_code(convert_language_code(&config.language))
        .media_sample_rate_hertz(config.sample_rate_hz as i32)
        .media_encoding(MediaEncoding::Pcm)
        .audio_stream(audio_stream.into())
        .send()
        .await
        .map_err(|e| SttError::Connection(e.to_string()))?;

    if let Some(sid) = output.session_id() {
        info!("Amazon Transcribe session started: {}", sid);
    }

    // Forward classified events from the SDK result stream into a channel so
    // callers never touch raw SDK shapes. The task ends when the backend
    // closes the stream or the receiver is dropped.
    let (events_tx, events_rx) = mpsc::unbounded_channel::<Result<TranscriptEvent, SttError>>();
    tokio::spawn(async move {
        let mut result_stream = output.transcript_result_stream;
        loop {
            match result_stream.recv().await {
                Ok(Some(TranscriptResultStream::TranscriptEvent(event))) => {
                    let Some(transcript) = event.transcript else {
                        continue;
                    };
                    for result in transcript.results.unwrap_or_default() {
                        if let Some(alternatives) = &result.alternatives
                            && let Some(alt) = alternatives.first()
                            && let Some(text) = &alt.transcript
                        {
                            // Skip empty transcripts
                            if text.trim().is_empty() {
                                continue;
                            }

                            let raw = RawTranscriptResult {
                                transcript: text.clone(),
                                is_partial: Some(result.is_partial),
                                result_type: None,
                                result_id: result.result_id.clone(),
                            };
                            if events_tx.send(Ok(raw.into())).is_err() {
                                debug!("Transcript receiver dropped, stopping forwarder");
                                return;
                            }
                        }
                    }
                }
                Ok(Some(_)) => {
                    debug!("Received unknown event type from Transcribe");
                }
                Ok(None) => {
                    info!("Transcribe result stream ended");
                    return;
                }
                Err(e) => {
                    let stt_error = SttError::Stream(e.to_string());
                    error!("{}", stt_error);
                    let _ = events_tx.send(Err(stt_error));
                    return;
                }
            }
        }
    });

    Ok((
        TranscribeInput {
            audio_tx: Some(audio_tx),
        },
        TranscribeEvents { events_rx },
    ))
}

// =============================================================================
// Session Halves
// =============================================================================

/// Audio-sending half of a Transcribe session.
pub struct TranscribeInput {
    audio_tx: Option<mpsc::Sender<Bytes>>,
}

#[async_trait]
impl SessionInput for TranscribeInput {
    async fn send_audio(&mut self, frame: Bytes) -> Result<(), SttError> {
        let Some(tx) = &self.audio_tx else {
            return Err(SttError::ChannelClosed(
                "audio stream already ended".to_string(),
            ));
        };
        tx.send(frame).await.map_err(|_| {
            SttError::ChannelClosed("session dropped the audio stream".to_string())
        })
    }

    async fn end_stream(&mut self) -> Result<(), SttError> {
        // Dropping the sender closes the SDK's audio event stream, which
        // tells the backend no further audio is coming. Safe to call twice.
        if self.audio_tx.take().is_some() {
            debug!("Audio stream ended");
        }
        Ok(())
    }
}

/// Event-yielding half of a Transcribe session.
pub struct TranscribeEvents {
    events_rx: mpsc::UnboundedReceiver<Result<TranscriptEvent, SttError>>,
}

#[async_trait]
impl SessionEvents for TranscribeEvents {
    async fn next_event(&mut self) -> Option<Result<TranscriptEvent, SttError>> {
        self.events_rx.recv().await
    }
}
