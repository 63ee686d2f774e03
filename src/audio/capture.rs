//! Microphone capture for the local relay mode.
//!
//! The cpal callback runs on a hardware thread outside the tokio runtime, so
//! captured blocks cross into the relay through a bounded channel: the
//! callback enqueues with `try_send` (it must never block) and the consumer
//! side implements [`FrameSource`]. On overflow the newest block is dropped
//! and counted; memory stays bounded under a stalled consumer.
//!
//! Samples are converted to 16-bit signed little-endian PCM before they are
//! yielded, so a frame here is wire-identical to a browser frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::relay::FrameSource;

/// Capacity of the callback-to-consumer queue, in capture blocks.
/// At ~100 ms per block this holds a few seconds of audio.
const QUEUE_CAPACITY: usize = 32;

/// Microphone capture error.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("no input device available")]
    NoDevice,

    #[error("failed to query input config: {0}")]
    Config(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to build input stream: {0}")]
    Build(String),

    #[error("failed to start input stream: {0}")]
    Start(String),

    #[error("capture thread terminated before the stream started")]
    ThreadDied,
}

/// Frame source fed by the capture thread.
pub struct MicSource {
    frames: mpsc::Receiver<Bytes>,
}

#[async_trait]
impl FrameSource for MicSource {
    async fn next_frame(&mut self) -> Option<Bytes> {
        self.frames.recv().await
    }
}

/// Handle that stops the capture stream when told to, or when dropped.
///
/// Stopping tears down the cpal stream, which closes the frame channel and
/// ends the [`MicSource`] sequence.
pub struct CaptureHandle {
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl CaptureHandle {
    /// Stop capturing. Idempotent.
    pub fn stop(&mut self) {
        // Dropping the sender wakes the capture thread out of its park.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > 0 {
            warn!("Capture queue overflowed, {} block(s) dropped", dropped);
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start capturing from the default input device at the given sample rate,
/// mono.
///
/// The cpal stream lives on a dedicated thread because it is not `Send`.
/// The thread parks until the [`CaptureHandle`] stops it.
pub fn start_capture(sample_rate_hz: u32) -> Result<(MicSource, CaptureHandle), CaptureError> {
    let (frame_tx, frame_rx) = mpsc::channel::<Bytes>(QUEUE_CAPACITY);
    let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), CaptureError>>();
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_for_thread = dropped.clone();

    let thread = std::thread::spawn(move || {
        let stream = match build_stream(sample_rate_hz, frame_tx, dropped_for_thread) {
            Ok(stream) => {
                let _ = ready_tx.send(Ok(()));
                stream
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        // Park until the handle stops us or is dropped.
        let _ = stop_rx.recv();

        use cpal::traits::StreamTrait;
        let _ = stream.pause();
        // Dropping the stream drops the callback and with it the frame
        // sender, ending the MicSource sequence.
    });

    match ready_rx.recv() {
        Ok(Ok(())) => {
            info!("Microphone capture started at {} Hz", sample_rate_hz);
            Ok((
                MicSource { frames: frame_rx },
                CaptureHandle {
                    stop_tx: Some(stop_tx),
                    thread: Some(thread),
                    dropped,
                },
            ))
        }
        Ok(Err(e)) => {
            let _ = thread.join();
            Err(e)
        }
        Err(_) => Err(CaptureError::ThreadDied),
    }
}

/// Build and start the cpal input stream for the default device.
fn build_stream(
    sample_rate_hz: u32,
    frame_tx: mpsc::Sender<Bytes>,
    dropped: Arc<AtomicU64>,
) -> Result<cpal::Stream, CaptureError> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::Config(e.to_string()))?;

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: sample_rate_hz,
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err| warn!("Audio stream error: {}", err);

    let stream = match supported.sample_format() {
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| {
                enqueue_block(&frame_tx, &dropped, pcm_bytes(data));
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| {
                let samples: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
                enqueue_block(&frame_tx, &dropped, pcm_bytes(&samples));
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _| {
                let samples: Vec<i16> = data.iter().map(|&s| u16_to_i16(s)).collect();
                enqueue_block(&frame_tx, &dropped, pcm_bytes(&samples));
            },
            err_fn,
            None,
        ),
        format => return Err(CaptureError::UnsupportedFormat(format!("{:?}", format))),
    }
    .map_err(|e| CaptureError::Build(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::Start(e.to_string()))?;

    Ok(stream)
}

/// Hand one block to the consumer without blocking the hardware callback.
fn enqueue_block(frame_tx: &mpsc::Sender<Bytes>, dropped: &AtomicU64, block: Bytes) {
    match frame_tx.try_send(block) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            dropped.fetch_add(1, Ordering::Relaxed);
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            // Consumer gone; the stream is about to be stopped.
        }
    }
}

/// Convert a float sample to 16-bit signed PCM.
#[inline]
fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).clamp(-32768.0, 32767.0) as i16
}

/// Convert an unsigned 16-bit sample to signed PCM.
#[inline]
fn u16_to_i16(sample: u16) -> i16 {
    (sample as i32 - 32768) as i16
}

/// Serialize samples to little-endian PCM bytes.
fn pcm_bytes(samples: &[i16]) -> Bytes {
    let mut buf = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }
    Bytes::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_conversion_clamps() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), 32767);
        assert_eq!(f32_to_i16(-1.0), -32768);
        assert_eq!(f32_to_i16(2.0), 32767);
        assert_eq!(f32_to_i16(-2.0), -32768);
    }

    #[test]
    fn u16_conversion_centers_on_zero() {
        assert_eq!(u16_to_i16(32768), 0);
        assert_eq!(u16_to_i16(0), -32768);
        assert_eq!(u16_to_i16(65535), 32767);
    }

    #[test]
    fn pcm_bytes_are_little_endian() {
        let bytes = pcm_bytes(&[0x0102, -2]);
        assert_eq!(bytes.as_ref(), &[0x02, 0x01, 0xFE, 0xFF]);
    }

    #[tokio::test]
    async fn overflow_drops_newest_and_counts() {
        let (tx, mut rx) = mpsc::channel::<Bytes>(1);
        let dropped = AtomicU64::new(0);

        enqueue_block(&tx, &dropped, Bytes::from_static(b"a"));
        enqueue_block(&tx, &dropped, Bytes::from_static(b"b"));

        assert_eq!(dropped.load(Ordering::Relaxed), 1);
        assert_eq!(rx.recv().await.unwrap().as_ref(), b"a");
    }

    #[tokio::test]
    async fn mic_source_ends_when_sender_drops() {
        let (tx, rx) = mpsc::channel::<Bytes>(QUEUE_CAPACITY);
        let mut source = MicSource { frames: rx };
        drop(tx);
        assert!(source.next_frame().await.is_none());
    }
}
