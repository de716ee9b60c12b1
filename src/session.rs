//! Recording session lifecycle
//!
//! A session owns one capture buffer fed by the capture channel. At most one
//! session exists at a time; the orchestrator enforces that before starting
//! a new one.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::audio::{encode_wav, CaptureBuffer};
use crate::{Error, Result};

/// One bounded recording: capture buffer plus the pump that fills it
pub struct RecordingSession {
    buffer: Arc<Mutex<CaptureBuffer>>,
    pump: tokio::task::JoinHandle<()>,
    sample_rate: u32,
}

impl RecordingSession {
    /// Begin a session over an open capture channel.
    ///
    /// The pump task appends chunks until the channel closes (capture stop).
    #[must_use]
    pub fn begin(mut chunks: mpsc::UnboundedReceiver<Vec<f32>>, sample_rate: u32) -> Self {
        let buffer = Arc::new(Mutex::new(CaptureBuffer::new()));
        if let Ok(mut buf) = buffer.lock() {
            buf.start();
        }

        let pump_buffer = Arc::clone(&buffer);
        let pump = tokio::spawn(async move {
            while let Some(chunk) = chunks.recv().await {
                if let Ok(mut buf) = pump_buffer.lock() {
                    buf.push(chunk);
                }
            }
            tracing::debug!("capture channel closed");
        });

        tracing::debug!(sample_rate, "recording session started");
        Self {
            buffer,
            pump,
            sample_rate,
        }
    }

    /// Finish the session and encode the recording as WAV.
    ///
    /// The caller must stop the capture source first so the channel closes
    /// and the pump drains the remaining chunks.
    ///
    /// # Errors
    ///
    /// Returns error if the pump task panicked or encoding fails
    pub async fn finish(self) -> Result<Vec<u8>> {
        self.pump
            .await
            .map_err(|e| Error::Audio(format!("capture pump failed: {e}")))?;

        let chunks = self
            .buffer
            .lock()
            .map(|mut buf| buf.stop())
            .unwrap_or_default();

        let samples: usize = chunks.iter().map(Vec::len).sum();
        tracing::debug!(samples, "recording session finished");

        encode_wav(&chunks, self.sample_rate)
    }
}
