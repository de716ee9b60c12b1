//! HTTP client for the emotion/chat backend
//!
//! Every transport failure or non-success status maps to a connectivity
//! error, which callers treat as retry-safe: local state is never changed on
//! a failed call.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{Error, Result};

/// Response from `POST /emotion`
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionResponse {
    /// Detected emotion label (e.g. "happy", "sad", "angry", "neutral")
    pub emotion: String,
    /// Model confidence in [0, 1]
    pub confidence: f32,
}

/// Response from `POST /chat-text`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTextResponse {
    /// Reply text from the chat model
    pub reply_text: String,
    /// Optional URL of synthesized reply audio
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Response from `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Echo of the user's transcript as the backend understood it
    pub user_text: String,
    /// Reply text from the chat model
    pub reply_text: String,
    /// Detected emotion label
    pub emotion: String,
    /// Model confidence in [0, 1]
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Optional URL of synthesized reply audio
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// The chat operation the orchestrator depends on
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the session audio and transcript, returning the exchange result
    ///
    /// # Errors
    ///
    /// Returns a connectivity error on transport failure or non-2xx status
    async fn chat(&self, wav: Vec<u8>, text: &str) -> Result<ChatResponse>;

    /// Get a chat reply for an already-transcribed or typed text
    ///
    /// # Errors
    ///
    /// Returns a connectivity error on transport failure or non-2xx status
    async fn chat_text(&self, text: &str, emotion: Option<&str>) -> Result<ChatTextResponse>;

    /// Fetch reply audio the backend referenced by URL
    ///
    /// # Errors
    ///
    /// Returns a connectivity error on transport failure or non-2xx status
    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>>;
}

/// Client for the emotion/chat backend API
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client with the given base URL and request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Detect the emotion in a WAV recording via `POST /emotion`
    ///
    /// # Errors
    ///
    /// Returns a connectivity error on transport failure or non-2xx status
    pub async fn detect_emotion(&self, wav: Vec<u8>) -> Result<EmotionResponse> {
        let form = reqwest::multipart::Form::new().part("file", wav_part(wav)?);

        let response = self
            .client
            .post(format!("{}/emotion", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(connectivity)?;

        parse_response(response).await
    }

}

#[async_trait]
impl ChatBackend for BackendClient {
    async fn chat(&self, wav: Vec<u8>, text: &str) -> Result<ChatResponse> {
        tracing::debug!(
            audio_bytes = wav.len(),
            text_len = text.len(),
            "sending chat request"
        );

        let form = reqwest::multipart::Form::new()
            .part("file", wav_part(wav)?)
            .text("text", text.to_string());

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(connectivity)?;

        let result: ChatResponse = parse_response(response).await?;
        tracing::info!(
            emotion = %result.emotion,
            reply_len = result.reply_text.len(),
            "chat response received"
        );
        Ok(result)
    }

    async fn chat_text(&self, text: &str, emotion: Option<&str>) -> Result<ChatTextResponse> {
        let response = self
            .client
            .post(format!("{}/chat-text", self.base_url))
            .json(&serde_json::json!({ "text": text, "emotion": emotion }))
            .send()
            .await
            .map_err(connectivity)?;

        parse_response(response).await
    }

    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>> {
        // Relative URLs are resolved against the backend base
        let absolute = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        };

        let response = self
            .client
            .get(&absolute)
            .send()
            .await
            .map_err(connectivity)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Backend(format!("audio fetch failed: {status}")));
        }

        let bytes = response.bytes().await.map_err(connectivity)?;
        Ok(bytes.to_vec())
    }
}

fn wav_part(wav: Vec<u8>) -> Result<reqwest::multipart::Part> {
    reqwest::multipart::Part::bytes(wav)
        .file_name("audio.wav")
        .mime_str("audio/wav")
        .map_err(|e| Error::Backend(e.to_string()))
}

fn connectivity(e: reqwest::Error) -> Error {
    tracing::error!(error = %e, "backend request failed");
    Error::Backend(e.to_string())
}

async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "backend API error");
        return Err(Error::Backend(format!("backend error {status}")));
    }

    response.json().await.map_err(connectivity)
}
