//! Configuration management for the voice chat client

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Default backend base URL
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default backend request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default recognition locale
const DEFAULT_LOCALE: &str = "vi-VN";

/// Default capture sample rate (16kHz for speech)
const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Default capture chunk size in samples
const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default bound on waiting for the recognizer's final event in milliseconds
const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 300;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API configuration
    pub backend: BackendConfig,

    /// Audio capture configuration
    pub audio: AudioConfig,

    /// Speech recognition and synthesis configuration
    pub speech: SpeechConfig,
}

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the emotion/chat backend
    pub base_url: String,

    /// Request timeout for backend calls
    pub timeout: Duration,
}

/// Audio capture configuration
#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,

    /// Samples delivered per capture chunk
    pub chunk_size: usize,
}

/// Speech recognition and synthesis configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// BCP-47 locale used for recognition and voice matching
    pub locale: String,

    /// Bound on waiting for the recognizer's final event after stop
    pub flush_timeout: Duration,

    /// Transcription endpoint (Whisper-compatible multipart API)
    pub stt_url: String,

    /// Transcription model identifier
    pub stt_model: String,

    /// Speech synthesis endpoint (OpenAI-compatible speech API)
    pub tts_url: String,

    /// Speech synthesis model identifier
    pub tts_model: String,

    /// Voice identifier for synthesis
    pub tts_voice: String,

    /// Language tag of the configured voice
    pub tts_voice_lang: String,

    /// TTS speed multiplier
    pub tts_speed: f32,

    /// API key for the STT/TTS services (from `OPENAI_API_KEY` or config file)
    pub api_key: Option<String>,
}

/// On-disk configuration file layout; every field is optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    backend: FileBackend,
    #[serde(default)]
    audio: FileAudio,
    #[serde(default)]
    speech: FileSpeech,
}

#[derive(Debug, Default, Deserialize)]
struct FileBackend {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileAudio {
    sample_rate: Option<u32>,
    chunk_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSpeech {
    locale: Option<String>,
    flush_timeout_ms: Option<u64>,
    stt_url: Option<String>,
    stt_model: Option<String>,
    tts_url: Option<String>,
    tts_model: Option<String>,
    tts_voice: Option<String>,
    tts_voice_lang: Option<String>,
    tts_speed: Option<f32>,
    api_key: Option<String>,
}

impl Config {
    /// Load configuration from the platform config directory, applying
    /// environment variable overrides on top of file values and defaults
    ///
    /// # Errors
    ///
    /// Returns error if the config file exists but cannot be read or parsed
    pub fn load() -> Result<Self> {
        let path = config_file_path();
        let file = match &path {
            Some(p) if p.exists() => Self::read_file(p)?,
            _ => FileConfig::default(),
        };
        Ok(Self::from_file(file))
    }

    /// Load configuration from an explicit file path
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = Self::read_file(path)?;
        Ok(Self::from_file(file))
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let file = toml::from_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(file)
    }

    fn from_file(file: FileConfig) -> Self {
        let base_url = env_var("VOCA_BACKEND_URL")
            .or(file.backend.base_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let timeout_secs = env_var("VOCA_BACKEND_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .or(file.backend.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let locale = env_var("VOCA_LOCALE")
            .or(file.speech.locale)
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        let api_key = env_var("VOCA_API_KEY")
            .or_else(|| env_var("OPENAI_API_KEY"))
            .or(file.speech.api_key);

        Self {
            backend: BackendConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            audio: AudioConfig {
                sample_rate: file.audio.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
                chunk_size: file.audio.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            },
            speech: SpeechConfig {
                locale,
                flush_timeout: Duration::from_millis(
                    file.speech
                        .flush_timeout_ms
                        .unwrap_or(DEFAULT_FLUSH_TIMEOUT_MS),
                ),
                stt_url: file.speech.stt_url.unwrap_or_else(|| {
                    "https://api.openai.com/v1/audio/transcriptions".to_string()
                }),
                stt_model: file
                    .speech
                    .stt_model
                    .unwrap_or_else(|| "whisper-1".to_string()),
                tts_url: file
                    .speech
                    .tts_url
                    .unwrap_or_else(|| "https://api.openai.com/v1/audio/speech".to_string()),
                tts_model: file
                    .speech
                    .tts_model
                    .unwrap_or_else(|| "tts-1".to_string()),
                tts_voice: file
                    .speech
                    .tts_voice
                    .unwrap_or_else(|| "alloy".to_string()),
                tts_voice_lang: file
                    .speech
                    .tts_voice_lang
                    .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
                tts_speed: file.speech.tts_speed.unwrap_or(1.0),
                api_key,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(FileConfig::default())
    }
}

/// Path of the user config file, if a home directory can be determined
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "voca")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
