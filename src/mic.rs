//! Local relay mode: microphone to Transcribe to stdout.
//!
//! Captures from the default input device, relays frames to a streaming
//! transcription session, and prints transcript events as they arrive.
//! Runs until interrupted; Ctrl-C stops capture, lets the pump close the
//! backend stream, and waits for the relay to finish before exiting.

use std::io::Write;

use async_trait::async_trait;
use tracing::info;

use crate::audio::start_capture;
use crate::config::RelayConfig;
use crate::core::stt::TranscriptEvent;
use crate::core::stt::aws_transcribe::start_session;
use crate::relay::{SinkClosed, TranscriptSink, run_relay};

/// Transcript sink that prints to stdout.
///
/// Partial hypotheses overwrite the current line; finals commit it.
#[derive(Default)]
struct StdoutSink;

#[async_trait]
impl TranscriptSink for StdoutSink {
    async fn forward(&mut self, event: TranscriptEvent) -> Result<(), SinkClosed> {
        let mut stdout = std::io::stdout().lock();
        let result = if event.is_final {
            writeln!(stdout, "\r{}", event.text)
        } else {
            write!(stdout, "\r{}", event.text)
        };
        result.and_then(|_| stdout.flush()).map_err(|_| SinkClosed)
    }
}

/// Run the local relay until interrupted or until the session ends.
pub async fn run(config: &RelayConfig) -> anyhow::Result<()> {
    let (input, events) = start_session(&config.transcribe()).await?;
    let (source, mut capture) = start_capture(config.sample_rate_hz)?;

    println!("Listening (Ctrl-C to stop)...");
    let relay = tokio::spawn(run_relay(source, input, events, StdoutSink));

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        println!("\nShutting down, closing transcription stream...");
        info!("Interrupt received, stopping capture");
    };
    supervise(relay, shutdown, move || capture.stop()).await?;

    Ok(())
}

/// Wait for the relay to finish or the shutdown signal, whichever first.
///
/// On shutdown, stopping capture ends the frame source; the pump then
/// closes the backend stream, which drains and completes the relay. The
/// relay can also end on its own (backend stream failure); the microphone
/// is released and the mode exits rather than capturing into a dead
/// session.
async fn supervise<S, F>(
    relay: tokio::task::JoinHandle<()>,
    shutdown: S,
    stop_capture: F,
) -> Result<(), tokio::task::JoinError>
where
    S: Future<Output = ()>,
    F: FnOnce(),
{
    let mut relay = relay;
    tokio::select! {
        _ = shutdown => {
            stop_capture();
            relay.await
        }
        result = &mut relay => {
            info!("Relay session ended, stopping capture");
            stop_capture();
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn supervise_exits_when_relay_ends_without_signal() {
        // Relay completing on its own (backend failure) must release the
        // capture and return, even though no interrupt ever arrives.
        let relay = tokio::spawn(async {});
        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_flag = stopped.clone();

        let result = supervise(relay, std::future::pending::<()>(), move || {
            stopped_flag.store(true, Ordering::SeqCst);
        })
        .await;

        assert!(result.is_ok());
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn supervise_stops_capture_then_awaits_relay_on_signal() {
        // The relay here only finishes once capture is stopped, like the
        // real pump draining after its source ends.
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let relay = tokio::spawn(async move {
            let _ = rx.await;
        });

        let result = supervise(relay, std::future::ready(()), move || drop(tx)).await;
        assert!(result.is_ok());
    }
}
