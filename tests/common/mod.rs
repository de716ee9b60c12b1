//! Shared test utilities: signal generators and scripted collaborators
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use voca::audio::{CaptureSource, PlaybackSink};
use voca::recognition::{RecognitionEngine, RecognitionEvent, RecognitionResult};
use voca::synthesis::{SynthesisEngine, SynthesizedAudio, Voice};
use voca::{ChatBackend, ChatResponse, ChatTextResponse, Error, Result};

/// Generate sine wave audio samples
pub fn generate_sine_samples(
    sample_rate: u32,
    frequency: f32,
    duration_secs: f32,
    amplitude: f32,
) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
pub fn generate_silence(sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    vec![0.0; (sample_rate as f32 * duration_secs) as usize]
}

/// Capture source that replays preset chunks and closes the channel
pub struct ScriptedCapture {
    chunks: Vec<Vec<f32>>,
    sample_rate: u32,
    pub starts: usize,
}

impl ScriptedCapture {
    pub fn new(chunks: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            chunks,
            sample_rate,
            starts: 0,
        }
    }
}

impl CaptureSource for ScriptedCapture {
    fn start(&mut self) -> Result<mpsc::UnboundedReceiver<Vec<f32>>> {
        self.starts += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in self.chunks.clone() {
            tx.send(chunk).expect("receiver alive");
        }
        // Dropping the sender closes the channel, like a stopped stream
        Ok(rx)
    }

    fn stop(&mut self) {}

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Recognition engine that emits preset events followed by End
pub struct ScriptedRecognitionEngine {
    events: Vec<RecognitionEvent>,
    delay: Duration,
    pub received: Mutex<Vec<(usize, String)>>,
}

impl ScriptedRecognitionEngine {
    pub fn new(events: Vec<RecognitionEvent>) -> Self {
        Self {
            events,
            delay: Duration::ZERO,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Engine that finalizes a single transcript
    pub fn with_final(text: &str) -> Self {
        Self::new(vec![RecognitionEvent::Results {
            result_index: 0,
            results: vec![RecognitionResult {
                transcript: text.to_string(),
                is_final: true,
            }],
        }])
    }

    /// Engine that finalizes a single transcript after a delay, like an
    /// HTTP engine transcribing the whole utterance at stop time
    pub fn with_final_after(text: &str, delay: Duration) -> Self {
        let mut engine = Self::with_final(text);
        engine.delay = delay;
        engine
    }

    /// Engine that recognizes nothing
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl RecognitionEngine for ScriptedRecognitionEngine {
    async fn transcribe(
        &self,
        wav: Vec<u8>,
        locale: &str,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) {
        self.received
            .lock()
            .expect("lock")
            .push((wav.len(), locale.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        for event in self.events.clone() {
            let _ = events.send(event);
        }
        let _ = events.send(RecognitionEvent::End);
    }
}

/// Chat backend stub recording calls and returning a canned response
pub struct StubBackend {
    pub response: Mutex<Option<ChatResponse>>,
    pub calls: Mutex<Vec<(usize, String)>>,
    pub text_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl StubBackend {
    pub fn replying(reply: ChatResponse) -> Self {
        Self {
            response: Mutex::new(Some(reply)),
            calls: Mutex::new(Vec::new()),
            text_calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend that always fails with a connectivity error
    pub fn unreachable() -> Self {
        Self {
            response: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            text_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }
}

#[async_trait]
impl ChatBackend for StubBackend {
    async fn chat(&self, wav: Vec<u8>, text: &str) -> Result<ChatResponse> {
        self.calls
            .lock()
            .expect("lock")
            .push((wav.len(), text.to_string()));
        self.response
            .lock()
            .expect("lock")
            .clone()
            .ok_or_else(|| Error::Backend("connection refused".to_string()))
    }

    async fn chat_text(&self, text: &str, emotion: Option<&str>) -> Result<ChatTextResponse> {
        self.text_calls
            .lock()
            .expect("lock")
            .push((text.to_string(), emotion.map(ToString::to_string)));
        self.response
            .lock()
            .expect("lock")
            .clone()
            .map(|r| ChatTextResponse {
                reply_text: r.reply_text,
                audio_url: r.audio_url,
            })
            .ok_or_else(|| Error::Backend("connection refused".to_string()))
    }

    async fn fetch_audio(&self, _url: &str) -> Result<Vec<u8>> {
        Err(Error::Backend("no audio".to_string()))
    }
}

/// Canned chat response helper
pub fn chat_reply(reply_text: &str, emotion: &str) -> ChatResponse {
    ChatResponse {
        user_text: String::new(),
        reply_text: reply_text.to_string(),
        emotion: emotion.to_string(),
        confidence: Some(0.9),
        audio_url: None,
    }
}

/// Synthesis engine producing short PCM clips without any network
pub struct FakeSynthesisEngine {
    voices: Vec<Voice>,
    pub requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeSynthesisEngine {
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SynthesisEngine for FakeSynthesisEngine {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SynthesizedAudio> {
        self.requests
            .lock()
            .expect("lock")
            .push((text.to_string(), voice.map(ToString::to_string)));
        Ok(SynthesizedAudio::Pcm {
            samples: vec![0.0; 256],
            sample_rate: 16_000,
        })
    }
}

/// Playback sink that records each play and blocks until cancelled
pub struct BlockingSink {
    pub plays: Mutex<Vec<Arc<AtomicBool>>>,
}

impl BlockingSink {
    pub fn new() -> Self {
        Self {
            plays: Mutex::new(Vec::new()),
        }
    }

    pub fn play_count(&self) -> usize {
        self.plays.lock().expect("lock").len()
    }

    pub fn was_cancelled(&self, index: usize) -> bool {
        self.plays.lock().expect("lock")[index].load(Ordering::Relaxed)
    }
}

impl PlaybackSink for BlockingSink {
    fn play(&self, _samples: Vec<f32>, _sample_rate: u32, cancel: &Arc<AtomicBool>) -> Result<()> {
        self.plays.lock().expect("lock").push(Arc::clone(cancel));
        let start = std::time::Instant::now();
        while !cancel.load(Ordering::Relaxed) {
            if start.elapsed() > std::time::Duration::from_secs(2) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        Ok(())
    }
}

/// Playback sink that returns immediately
pub struct NullSink;

impl PlaybackSink for NullSink {
    fn play(&self, _samples: Vec<f32>, _sample_rate: u32, _cancel: &Arc<AtomicBool>) -> Result<()> {
        Ok(())
    }
}
