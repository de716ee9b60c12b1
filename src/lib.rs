//! voca - Voice chat client with emotion-aware replies
//!
//! Captures microphone audio, keeps a running transcript through a pluggable
//! recognition engine, sends the finished WAV plus transcript to a backend
//! for emotion detection and a chat reply, and speaks the reply back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                Chat orchestrator                  │
//! │  record / stop / send  │  conversation  │ speak  │
//! └───────┬───────────────────┬──────────────┬───────┘
//!         │                   │              │
//!   ┌─────▼─────┐      ┌──────▼──────┐  ┌────▼─────┐
//!   │  Capture  │      │ Recognition │  │ Synthesis│
//!   │  + WAV    │      │   adapter   │  │  adapter │
//!   └───────────┘      └─────────────┘  └──────────┘
//!                             │
//!                   ┌─────────▼─────────┐
//!                   │  Backend HTTP API │
//!                   │  /emotion  /chat  │
//!                   └───────────────────┘
//! ```

pub mod api;
pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod recognition;
pub mod session;
pub mod synthesis;

pub use api::{BackendClient, ChatBackend, ChatResponse, ChatTextResponse, EmotionResponse};
pub use chat::{ChatOptions, ChatOrchestrator, Message, Role, emotion_display};
pub use config::Config;
pub use error::{Error, Result};
pub use recognition::{
    HttpRecognitionEngine, RecognitionEngine, RecognitionEvent, RecognitionResult,
    RecognizerState, SpeechRecognizer, TranscriptState,
};
pub use session::RecordingSession;
pub use synthesis::{
    HttpSynthesisEngine, SynthesisEngine, SynthesizedAudio, Synthesizer, Voice,
};
