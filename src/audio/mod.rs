//! Audio capture, buffering, WAV encoding, and playback

mod buffer;
mod capture;
mod playback;
mod wav;

pub use buffer::CaptureBuffer;
pub use capture::{AudioCapture, CaptureSource};
pub use playback::{CpalSink, PlaybackSink, decode_mp3};
pub use wav::{encode_wav, sample_to_i16};
