//! Speech recognition adapter
//!
//! The adapter consumes recognition events from a pluggable engine and
//! maintains a growing final transcript alongside a per-event interim
//! transcript. Events carry a result index and the window of entries at or
//! after it; the window may revise earlier interim entries, so interim text
//! is rebuilt from scratch on every event and only entries flagged final are
//! appended to the accumulator.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{Error, Result};

/// One recognition alternative within an event window
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    /// Recognized text for this entry
    pub transcript: String,
    /// Whether the engine has committed to this entry
    pub is_final: bool,
}

/// Event emitted by a recognition engine
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// A window of results starting at `result_index`
    Results {
        /// Index of the first entry in this window within the full result list
        result_index: usize,
        /// Entries at or after the index, re-delivered on revision
        results: Vec<RecognitionResult>,
    },
    /// A runtime error; reported to the caller but never fatal to listening
    Error(String),
    /// The engine has flushed all results for this session
    End,
}

/// Recognizer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerState {
    /// Not listening
    Idle,
    /// Consuming events from an active engine stream
    Listening,
}

/// Running transcript for one recording session
#[derive(Debug, Default, Clone)]
pub struct TranscriptState {
    final_text: String,
    interim_text: String,
}

impl TranscriptState {
    /// Accumulated finalized text; grows only, until reset
    #[must_use]
    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    /// In-progress text, replaced on every recognition event
    #[must_use]
    pub fn interim_text(&self) -> &str {
        &self.interim_text
    }

    /// Finalized and in-progress text together, for display
    #[must_use]
    pub fn display_text(&self) -> String {
        format!("{}{}", self.final_text, self.interim_text)
    }

    fn clear(&mut self) {
        self.final_text.clear();
        self.interim_text.clear();
    }
}

/// An engine that turns a finished utterance into recognition events.
///
/// Implementations send any number of `Results` events followed by exactly
/// one `End`; errors are delivered as `Error` events so a failed engine call
/// still terminates the stream.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Transcribe the utterance, emitting events on `events`
    async fn transcribe(
        &self,
        wav: Vec<u8>,
        locale: &str,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    );
}

/// Consumes engine events and accumulates the session transcript
pub struct SpeechRecognizer {
    state: RecognizerState,
    transcript: TranscriptState,
    last_error: Option<String>,
    ended: bool,
    events: Option<mpsc::UnboundedReceiver<RecognitionEvent>>,
    flush_timeout: Duration,
}

impl SpeechRecognizer {
    /// Create an idle recognizer with the given flush bound
    #[must_use]
    pub const fn new(flush_timeout: Duration) -> Self {
        Self {
            state: RecognizerState::Idle,
            transcript: TranscriptState {
                final_text: String::new(),
                interim_text: String::new(),
            },
            last_error: None,
            ended: false,
            events: None,
            flush_timeout,
        }
    }

    /// Begin listening; returns the sender the engine emits events on.
    ///
    /// Any previous event stream is discarded. Call `reset` first when
    /// starting a new session so transcripts never mix.
    pub fn start(&mut self) -> mpsc::UnboundedSender<RecognitionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(rx);
        self.ended = false;
        self.state = RecognizerState::Listening;
        tracing::debug!("recognizer listening");
        tx
    }

    /// Apply all events already delivered, without waiting
    pub fn poll_events(&mut self) {
        if let Some(rx) = &mut self.events {
            while let Ok(event) = rx.try_recv() {
                Self::apply(
                    &mut self.transcript,
                    &mut self.last_error,
                    &mut self.ended,
                    event,
                );
            }
        }
    }

    /// Wait for the engine's final event, applying events as they arrive.
    ///
    /// Resolves when the engine signals end-of-stream, the channel closes,
    /// or the flush bound elapses. A timed-out flush leaves the event stream
    /// in place, so a transcript that arrives late is picked up by the next
    /// poll or flush rather than lost.
    pub async fn flush(&mut self) {
        let Some(rx) = &mut self.events else {
            return;
        };

        let deadline = tokio::time::Instant::now() + self.flush_timeout;
        while !self.ended {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(event)) => Self::apply(
                    &mut self.transcript,
                    &mut self.last_error,
                    &mut self.ended,
                    event,
                ),
                Ok(None) => break,
                Err(_) => {
                    tracing::debug!("recognition flush timed out");
                    break;
                }
            }
        }
    }

    /// Stop listening, waiting for the engine's final event.
    ///
    /// Resolves as soon as the engine signals end-of-stream, or when the
    /// flush bound elapses. This replaces the fixed grace-period sleep the
    /// adapter's callers would otherwise need.
    pub async fn stop(&mut self) {
        if self.state != RecognizerState::Listening {
            return;
        }

        self.flush().await;
        self.state = RecognizerState::Idle;
        tracing::debug!(final_text = %self.transcript.final_text, "recognizer stopped");
    }

    /// Clear both transcripts and any recorded error
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.last_error = None;
    }

    fn apply(
        transcript: &mut TranscriptState,
        last_error: &mut Option<String>,
        ended: &mut bool,
        event: RecognitionEvent,
    ) {
        match event {
            RecognitionEvent::Results {
                result_index,
                results,
            } => {
                // The window re-delivers revised entries, so interim text is
                // rebuilt every event; only final entries are accumulated.
                let mut interim = String::new();
                for result in results {
                    if result.is_final {
                        transcript.final_text.push_str(&result.transcript);
                    } else {
                        interim.push_str(&result.transcript);
                    }
                }
                transcript.interim_text = interim;
                tracing::trace!(
                    result_index,
                    interim = %transcript.interim_text,
                    "recognition results applied"
                );
            }
            RecognitionEvent::Error(message) => {
                tracing::warn!(error = %message, "recognition error");
                *last_error = Some(message);
            }
            RecognitionEvent::End => {
                *ended = true;
            }
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> RecognizerState {
        self.state
    }

    /// Session transcript
    #[must_use]
    pub const fn transcript(&self) -> &TranscriptState {
        &self.transcript
    }

    /// Take the most recent recognition error, if any
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }
}

/// Response from a Whisper-compatible transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Recognition engine backed by a Whisper-compatible HTTP endpoint
pub struct HttpRecognitionEngine {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl HttpRecognitionEngine {
    /// Create a new HTTP recognition engine
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(url: String, api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            url,
            api_key,
            model,
        })
    }

    async fn request(&self, wav: Vec<u8>, locale: &str) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), locale, "starting transcription");

        // Whisper expects the bare language subtag, not the full locale
        let language = locale.split('-').next().unwrap_or(locale).to_string();

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Recognition(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", language);

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Recognition(format!(
                "transcription API error {status}: {body}"
            )));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

#[async_trait]
impl RecognitionEngine for HttpRecognitionEngine {
    async fn transcribe(
        &self,
        wav: Vec<u8>,
        locale: &str,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) {
        match self.request(wav, locale).await {
            Ok(text) => {
                let _ = events.send(RecognitionEvent::Results {
                    result_index: 0,
                    results: vec![RecognitionResult {
                        transcript: text,
                        is_final: true,
                    }],
                });
            }
            Err(e) => {
                let _ = events.send(RecognitionEvent::Error(e.to_string()));
            }
        }
        let _ = events.send(RecognitionEvent::End);
    }
}
