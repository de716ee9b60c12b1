//! Audio capture from microphone
//!
//! Chunks are delivered over an unbounded channel that closes when capture
//! stops, so the consumer sees an explicit end-of-stream instead of an
//! implicit callback teardown.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use tokio::sync::mpsc;

use crate::config::AudioConfig;
use crate::{Error, Result};

/// A source of fixed-size PCM chunks.
///
/// Exactly one capture may be running at a time; `start` while running is an
/// error so a new session can never steal the hardware from a live one.
pub trait CaptureSource {
    /// Begin capturing; the returned channel closes when capture stops
    ///
    /// # Errors
    ///
    /// Returns error if the device is unavailable or already capturing
    fn start(&mut self) -> Result<mpsc::UnboundedReceiver<Vec<f32>>>;

    /// Stop capturing and release the hardware handle
    fn stop(&mut self);

    /// Sample rate of the delivered chunks
    fn sample_rate(&self) -> u32;
}

/// Captures mono audio from the default input device
pub struct AudioCapture {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    sample_rate: u32,
    chunk_size: usize,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports mono capture at the
    /// configured rate
    pub fn new(audio: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(audio.sample_rate)
                    && c.max_sample_rate() >= SampleRate(audio.sample_rate)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(audio.sample_rate))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = audio.sample_rate,
            chunk_size = audio.chunk_size,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            sample_rate: audio.sample_rate,
            chunk_size: audio.chunk_size,
            stream: None,
        })
    }
}

impl CaptureSource for AudioCapture {
    fn start(&mut self) -> Result<mpsc::UnboundedReceiver<Vec<f32>>> {
        if self.stream.is_some() {
            return Err(Error::SessionActive);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let chunk_size = self.chunk_size;
        let mut pending: Vec<f32> = Vec::with_capacity(chunk_size);

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let config = self.config.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    pending.extend_from_slice(data);
                    while pending.len() >= chunk_size {
                        let rest = pending.split_off(chunk_size);
                        let chunk = std::mem::replace(&mut pending, rest);
                        if tx.send(chunk).is_err() {
                            return;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(rx)
    }

    fn stop(&mut self) {
        // Dropping the stream drops the callback's sender, closing the channel
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
