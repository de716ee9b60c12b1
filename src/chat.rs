//! Chat orchestration
//!
//! Sequences capture, recognition, the backend call, conversation updates,
//! and spoken replies into the user-facing record/stop/send operations.

use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::api::{ChatBackend, ChatResponse, ChatTextResponse};
use crate::audio::CaptureSource;
use crate::recognition::{RecognitionEngine, SpeechRecognizer, TranscriptState};
use crate::session::RecordingSession;
use crate::synthesis::Synthesizer;
use crate::{Error, Result};

/// Who produced a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The person speaking into the microphone
    User,
    /// The backend chat model
    Bot,
}

/// One entry in the conversation
#[derive(Debug, Clone)]
pub struct Message {
    /// Message author
    pub role: Role,
    /// Message text
    pub text: String,
    /// Detected emotion, present on user messages
    pub emotion: Option<String>,
    /// Emotion confidence, when the backend reports one
    pub confidence: Option<f32>,
    /// Local time the message was added
    pub timestamp: DateTime<Local>,
}

/// Display label and icon for an emotion name, matching the backend taxonomy
#[must_use]
pub fn emotion_display(emotion: &str) -> (&'static str, &'static str) {
    match emotion {
        "happy" => ("😊", "Vui vẻ"),
        "sad" => ("😢", "Buồn"),
        "angry" => ("😠", "Tức giận"),
        _ => ("😐", "Bình thường"),
    }
}

/// Orchestrator options derived from config
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Recognition and voice-matching locale
    pub locale: String,
}

/// Coordinates one conversation: recording sessions, backend exchanges, and
/// spoken replies
pub struct ChatOrchestrator {
    backend: Arc<dyn ChatBackend>,
    engine: Arc<dyn RecognitionEngine>,
    recognizer: SpeechRecognizer,
    synthesizer: Synthesizer,
    capture: Box<dyn CaptureSource>,
    session: Option<RecordingSession>,
    events_tx: Option<tokio::sync::mpsc::UnboundedSender<crate::recognition::RecognitionEvent>>,
    pending_audio: Option<Vec<u8>>,
    messages: Vec<Message>,
    current_emotion: Option<String>,
    locale: String,
}

impl ChatOrchestrator {
    /// Assemble an orchestrator from its collaborators
    #[must_use]
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        engine: Arc<dyn RecognitionEngine>,
        recognizer: SpeechRecognizer,
        synthesizer: Synthesizer,
        capture: Box<dyn CaptureSource>,
        options: ChatOptions,
    ) -> Self {
        Self {
            backend,
            engine,
            recognizer,
            synthesizer,
            capture,
            session: None,
            events_tx: None,
            pending_audio: None,
            messages: Vec::new(),
            current_emotion: None,
            locale: options.locale,
        }
    }

    /// Start a recording session: reset the transcript, open capture, begin
    /// recognition
    ///
    /// # Errors
    ///
    /// Returns `SessionActive` if a session is already running, or an audio
    /// error if the microphone cannot be opened
    pub fn start_recording(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::SessionActive);
        }

        self.recognizer.reset();
        let chunks = self.capture.start()?;
        self.session = Some(RecordingSession::begin(chunks, self.capture.sample_rate()));
        self.events_tx = Some(self.recognizer.start());

        tracing::info!("recording started");
        Ok(())
    }

    /// Stop the active session: close capture, encode the WAV, hand it to
    /// the recognition engine, and wait for the transcript to flush.
    ///
    /// A no-op when nothing is recording.
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    pub async fn stop_recording(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        self.capture.stop();
        let wav = session.finish().await?;

        if let Some(tx) = self.events_tx.take() {
            let engine = Arc::clone(&self.engine);
            let locale = self.locale.clone();
            let audio = wav.clone();
            tokio::spawn(async move {
                engine.transcribe(audio, &locale, tx).await;
            });
        }
        self.recognizer.stop().await;

        self.pending_audio = Some(wav);
        tracing::info!(
            transcript = %self.recognizer.transcript().final_text(),
            "recording stopped"
        );
        Ok(())
    }

    /// Send the finished recording and transcript to the backend.
    ///
    /// Stops the session first when still recording, then waits (bounded)
    /// for any recognition events still in flight, so a transcript that
    /// missed the stop-time flush is picked up here. Validation is
    /// transcript-then-audio: a missing transcript is reported before missing
    /// audio, and neither makes a network call. On success the user message
    /// (with detected emotion) and the bot reply are appended in that order
    /// and the reply is spoken; on backend failure the conversation is left
    /// unchanged and the send is safe to retry.
    ///
    /// # Errors
    ///
    /// Returns `NoSpeech`, `NoAudio`, or a connectivity error
    pub async fn send(&mut self) -> Result<ChatResponse> {
        if self.session.is_some() {
            self.stop_recording().await?;
        }
        self.recognizer.flush().await;

        let text = self.recognizer.transcript().final_text().trim().to_string();
        if text.is_empty() {
            return Err(Error::NoSpeech);
        }

        let Some(wav) = self.pending_audio.clone() else {
            return Err(Error::NoAudio);
        };

        let reply = self.backend.chat(wav, &text).await?;

        let timestamp = Local::now();
        self.current_emotion = Some(reply.emotion.clone());
        self.messages.push(Message {
            role: Role::User,
            text,
            emotion: Some(reply.emotion.clone()),
            confidence: reply.confidence,
            timestamp,
        });
        self.messages.push(Message {
            role: Role::Bot,
            text: reply.reply_text.clone(),
            emotion: None,
            confidence: None,
            timestamp,
        });

        self.pending_audio = None;
        self.recognizer.reset();

        self.speak_reply(reply.audio_url.as_deref(), &reply.reply_text)
            .await;
        Ok(reply)
    }

    /// Send a typed message, tagged with the current detected emotion.
    ///
    /// Same conversation and reply handling as `send`, without any audio.
    ///
    /// # Errors
    ///
    /// Returns `NoSpeech` for empty text, or a connectivity error
    pub async fn send_text(&mut self, text: &str) -> Result<ChatTextResponse> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(Error::NoSpeech);
        }

        let reply = self
            .backend
            .chat_text(&text, self.current_emotion.as_deref())
            .await?;

        let timestamp = Local::now();
        self.messages.push(Message {
            role: Role::User,
            text,
            emotion: self.current_emotion.clone(),
            confidence: None,
            timestamp,
        });
        self.messages.push(Message {
            role: Role::Bot,
            text: reply.reply_text.clone(),
            emotion: None,
            confidence: None,
            timestamp,
        });

        self.speak_reply(reply.audio_url.as_deref(), &reply.reply_text)
            .await;
        Ok(reply)
    }

    /// Speak the reply, preferring backend-provided audio when present.
    ///
    /// Failures are logged, never surfaced: the exchange already succeeded.
    async fn speak_reply(&mut self, audio_url: Option<&str>, text: &str) {
        let result = match audio_url {
            Some(url) => match self.backend.fetch_audio(url).await {
                Ok(bytes) => self.synthesizer.play_mp3(&bytes),
                Err(e) => Err(e),
            },
            None => self.synthesizer.speak(text, &self.locale).await,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to speak reply");
        }
    }

    /// Clear the conversation, pending audio, transcript and emotion
    pub fn clear(&mut self) {
        self.messages.clear();
        self.current_emotion = None;
        self.pending_audio = None;
        self.recognizer.reset();
        self.synthesizer.cancel();
    }

    /// Apply any recognition events already delivered (for display refresh)
    pub fn poll_recognition(&mut self) {
        self.recognizer.poll_events();
    }

    /// Session transcript
    #[must_use]
    pub const fn transcript(&self) -> &TranscriptState {
        self.recognizer.transcript()
    }

    /// Conversation so far
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recently detected emotion
    #[must_use]
    pub fn current_emotion(&self) -> Option<&str> {
        self.current_emotion.as_deref()
    }

    /// Whether a recording session is active
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Whether an encoded recording is waiting to be sent
    #[must_use]
    pub const fn has_pending_audio(&self) -> bool {
        self.pending_audio.is_some()
    }

    /// Take the most recent recognition error, if any
    pub fn take_recognition_error(&mut self) -> Option<String> {
        self.recognizer.take_error()
    }

    /// Direct access to the synthesizer, for cancel from the UI
    pub fn synthesizer_mut(&mut self) -> &mut Synthesizer {
        &mut self.synthesizer
    }
}
