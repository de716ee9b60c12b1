//! Speech synthesis adapter
//!
//! At most one utterance plays at a time: every `speak` cancels whatever is
//! in flight before starting, and there is no queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::audio::{decode_mp3, PlaybackSink};
use crate::{Error, Result};

/// A synthesis voice advertised by an engine
#[derive(Debug, Clone)]
pub struct Voice {
    /// Engine-specific voice identifier
    pub name: String,
    /// BCP-47 language tag of the voice
    pub lang: String,
}

/// Synthesized audio returned by an engine
#[derive(Debug, Clone)]
pub enum SynthesizedAudio {
    /// MP3 bytes, decoded before playback
    Mp3(Vec<u8>),
    /// Raw PCM samples
    Pcm {
        /// Mono f32 samples
        samples: Vec<f32>,
        /// Sample rate of the samples
        sample_rate: u32,
    },
}

/// An engine that lists voices and synthesizes audio for a text
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// Voices available from this engine
    fn voices(&self) -> Vec<Voice>;

    /// Synthesize `text`, optionally with a specific voice
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SynthesizedAudio>;
}

/// Speaks text through a playback sink, one utterance at a time
pub struct Synthesizer {
    engine: Arc<dyn SynthesisEngine>,
    sink: Arc<dyn PlaybackSink>,
    cancel_flag: Arc<AtomicBool>,
    current: Option<tokio::task::JoinHandle<()>>,
}

impl Synthesizer {
    /// Create a synthesizer over the given engine and sink
    #[must_use]
    pub fn new(engine: Arc<dyn SynthesisEngine>, sink: Arc<dyn PlaybackSink>) -> Self {
        Self {
            engine,
            sink,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            current: None,
        }
    }

    /// Speak `text` using a voice matching the locale's language prefix.
    ///
    /// Cancels any in-flight utterance first. Falls back to the engine's
    /// default voice when no language match exists.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails; playback failures are logged only
    pub async fn speak(&mut self, text: &str, locale: &str) -> Result<()> {
        self.cancel();

        let voice = self.match_voice(locale);
        tracing::debug!(locale, voice = ?voice, chars = text.len(), "speaking");

        let audio = self.engine.synthesize(text, voice.as_deref()).await?;
        self.play(audio)
    }

    /// Play already-synthesized MP3 bytes, cancelling any in-flight utterance
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not valid MP3
    pub fn play_mp3(&mut self, mp3_data: &[u8]) -> Result<()> {
        self.cancel();
        let (samples, sample_rate) = decode_mp3(mp3_data)?;
        self.play(SynthesizedAudio::Pcm {
            samples,
            sample_rate,
        })
    }

    fn play(&mut self, audio: SynthesizedAudio) -> Result<()> {
        let (samples, sample_rate) = match audio {
            SynthesizedAudio::Mp3(bytes) => decode_mp3(&bytes)?,
            SynthesizedAudio::Pcm {
                samples,
                sample_rate,
            } => (samples, sample_rate),
        };

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel_flag = Arc::clone(&cancel);

        let sink = Arc::clone(&self.sink);
        self.current = Some(tokio::task::spawn_blocking(move || {
            if let Err(e) = sink.play(samples, sample_rate, &cancel) {
                tracing::warn!(error = %e, "playback failed");
            }
        }));

        Ok(())
    }

    /// Stop any in-flight utterance
    pub fn cancel(&mut self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.current.take() {
            if !handle.is_finished() {
                tracing::debug!("cancelled in-flight utterance");
            }
            // The playback thread exits on its own once it sees the flag
            drop(handle);
        }
    }

    /// Whether an utterance is currently playing
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn match_voice(&self, locale: &str) -> Option<String> {
        let prefix = locale.split('-').next().unwrap_or(locale);
        self.engine
            .voices()
            .into_iter()
            .find(|v| v.lang.starts_with(prefix))
            .map(|v| v.name)
    }
}

/// Synthesis engine backed by an OpenAI-compatible speech endpoint
pub struct HttpSynthesisEngine {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    voice: Voice,
    speed: f32,
}

impl HttpSynthesisEngine {
    /// Create a new HTTP synthesis engine
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(
        url: String,
        api_key: String,
        model: String,
        voice: Voice,
        speed: f32,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("API key required for synthesis".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            url,
            api_key,
            model,
            voice,
            speed,
        })
    }
}

#[async_trait]
impl SynthesisEngine for HttpSynthesisEngine {
    fn voices(&self) -> Vec<Voice> {
        vec![self.voice.clone()]
    }

    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SynthesizedAudio> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: voice.unwrap_or(&self.voice.name),
            speed: self.speed,
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "speech API error {status}: {body}"
            )));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "synthesis complete");
        Ok(SynthesizedAudio::Mp3(audio.to_vec()))
    }
}
