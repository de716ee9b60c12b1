use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use voca::audio::{AudioCapture, CaptureSource, CpalSink};
use voca::chat::{ChatOptions, ChatOrchestrator, Role, emotion_display};
use voca::recognition::{HttpRecognitionEngine, SpeechRecognizer};
use voca::synthesis::{HttpSynthesisEngine, Synthesizer, Voice};
use voca::{BackendClient, Config, Error};

/// voca - Voice chat client with emotion-aware replies
#[derive(Parser)]
#[command(name = "voca", version, about)]
struct Cli {
    /// Backend base URL (overrides config file)
    #[arg(long, env = "VOCA_BACKEND_URL")]
    backend_url: Option<String>,

    /// Path to an explicit config file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Synthesize and speak a phrase
    Say {
        /// Text to speak
        #[arg(default_value = "Xin chào! Đây là bài kiểm tra tổng hợp giọng nói.")]
        text: String,
    },
    /// Detect the emotion in a WAV recording
    Emotion {
        /// Path to a WAV file
        file: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voca=info",
        1 => "info,voca=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::TestMic { duration }) => test_mic(&config, duration).await,
        Some(Command::TestSpeaker) => test_speaker().await,
        Some(Command::Say { text }) => say(&config, &text).await,
        Some(Command::Emotion { file }) => detect_emotion(&config, &file).await,
        None => chat_loop(config).await,
    }
}

/// Detect the emotion in a WAV file via the backend
async fn detect_emotion(config: &Config, file: &std::path::Path) -> anyhow::Result<()> {
    let wav = std::fs::read(file)?;
    let backend = BackendClient::new(&config.backend.base_url, config.backend.timeout)?;

    let result = backend.detect_emotion(wav).await?;
    let (icon, label) = emotion_display(&result.emotion);
    println!(
        "{icon} {label} ({}, confidence {:.2})",
        result.emotion, result.confidence
    );

    Ok(())
}

/// Interactive push-to-talk chat loop
#[allow(clippy::future_not_send)]
async fn chat_loop(config: Config) -> anyhow::Result<()> {
    let mut orchestrator = build_orchestrator(&config)?;

    println!("voca - voice chat with emotion-aware replies");
    println!("backend: {}", config.backend.base_url);
    println!();
    println!("  [enter]      start / stop recording");
    println!("  send         send the recording");
    println!("  clear        clear the conversation");
    println!("  quit         exit");
    println!("  <anything>   send it as a typed message");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => {
                if orchestrator.is_recording() {
                    match orchestrator.stop_recording().await {
                        Ok(()) => {
                            let transcript = orchestrator.transcript().display_text();
                            println!("■ recording stopped");
                            if transcript.trim().is_empty() {
                                println!("  (nothing recognized yet)");
                            } else {
                                println!("  heard: {transcript}");
                            }
                        }
                        Err(e) => println!("! {e}"),
                    }
                } else {
                    match orchestrator.start_recording() {
                        Ok(()) => println!("● recording... press enter to stop"),
                        Err(e) => println!("! {e}"),
                    }
                }
            }
            "send" | "s" => match orchestrator.send().await {
                Ok(_) => render_last_exchange(&orchestrator),
                Err(e @ (Error::NoSpeech | Error::NoAudio)) => println!("! {e}"),
                Err(e) if e.is_retryable() => println!("! {e} (retry with 'send')"),
                Err(e) => return Err(e.into()),
            },
            "clear" | "c" => {
                orchestrator.clear();
                println!("conversation cleared");
            }
            "quit" | "q" => break,
            typed => match orchestrator.send_text(typed).await {
                Ok(_) => render_last_exchange(&orchestrator),
                Err(e) if e.is_retryable() => println!("! {e} (retry by sending again)"),
                Err(e) => println!("! {e}"),
            },
        }

        if let Some(err) = orchestrator.take_recognition_error() {
            println!("! recognition: {err}");
        }
    }

    Ok(())
}

fn render_last_exchange(orchestrator: &ChatOrchestrator) {
    let messages = orchestrator.messages();
    for message in messages.iter().rev().take(2).rev() {
        let time = message.timestamp.format("%H:%M:%S");
        match message.role {
            Role::User => {
                let emotion = message.emotion.as_deref().unwrap_or("neutral");
                let (icon, label) = emotion_display(emotion);
                println!("[{time}] you ({icon} {label}): {}", message.text);
            }
            Role::Bot => println!("[{time}] bot: {}", message.text),
        }
    }
}

fn build_orchestrator(config: &Config) -> anyhow::Result<ChatOrchestrator> {
    let api_key = config.speech.api_key.clone().ok_or_else(|| {
        anyhow::anyhow!("no API key configured; set OPENAI_API_KEY or speech.api_key")
    })?;

    let backend = Arc::new(BackendClient::new(
        &config.backend.base_url,
        config.backend.timeout,
    )?);

    let engine = Arc::new(HttpRecognitionEngine::new(
        config.speech.stt_url.clone(),
        api_key.clone(),
        config.speech.stt_model.clone(),
    )?);

    let synthesis = Arc::new(HttpSynthesisEngine::new(
        config.speech.tts_url.clone(),
        api_key,
        config.speech.tts_model.clone(),
        Voice {
            name: config.speech.tts_voice.clone(),
            lang: config.speech.tts_voice_lang.clone(),
        },
        config.speech.tts_speed,
    )?);

    let capture = AudioCapture::new(&config.audio)?;

    Ok(ChatOrchestrator::new(
        backend,
        engine,
        SpeechRecognizer::new(config.speech.flush_timeout),
        Synthesizer::new(synthesis, Arc::new(CpalSink)),
        Box::new(capture),
        ChatOptions {
            locale: config.speech.locale.clone(),
        },
    ))
}

/// Test microphone input with a live level meter
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new(&config.audio)?;
    let mut chunks = capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let mut samples = Vec::new();
        while let Ok(chunk) = chunks.try_recv() {
            samples.extend(chunk);
        }

        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    use std::sync::atomic::AtomicBool;
    use voca::audio::PlaybackSink;

    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24_000u32;
    let frequency = 440.0f32;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..sample_rate * 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());

    let cancel = Arc::new(AtomicBool::new(false));
    tokio::task::spawn_blocking(move || CpalSink.play(samples, sample_rate, &cancel)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Synthesize and speak a phrase through the configured engine
#[allow(clippy::future_not_send)]
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let api_key = config.speech.api_key.clone().ok_or_else(|| {
        anyhow::anyhow!("no API key configured; set OPENAI_API_KEY or speech.api_key")
    })?;

    println!("Speaking: \"{text}\"");

    let engine = Arc::new(HttpSynthesisEngine::new(
        config.speech.tts_url.clone(),
        api_key,
        config.speech.tts_model.clone(),
        Voice {
            name: config.speech.tts_voice.clone(),
            lang: config.speech.tts_voice_lang.clone(),
        },
        config.speech.tts_speed,
    )?);

    let mut synthesizer = Synthesizer::new(engine, Arc::new(CpalSink));
    synthesizer.speak(text, &config.speech.locale).await?;

    // speak() returns as soon as playback starts; wait for it to finish
    while synthesizer.is_speaking() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}
