//! Error types for the voca voice chat client

use thiserror::Error;

/// Result type alias for voca operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice chat client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or capture error (includes permission failures)
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech recognition error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// No finalized transcript was available at send time
    #[error("no speech was recognized, please try again")]
    NoSpeech,

    /// No recorded audio was available at send time
    #[error("please record audio before sending")]
    NoAudio,

    /// A recording session is already in progress
    #[error("a recording session is already active")]
    SessionActive,

    /// Backend unreachable or returned a non-success status; safe to retry
    #[error("backend connection error: {0}")]
    Backend(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error is recoverable by simply retrying the send
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Http(_))
    }
}
