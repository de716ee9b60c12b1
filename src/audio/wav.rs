//! WAV encoding of captured PCM samples
//!
//! Output is the canonical 44-byte mono 16-bit PCM container: RIFF size
//! 36 + 2n, format tag 1, block align 2, byte rate 2x the sample rate.

use crate::{Error, Result};

/// Convert one float sample to a 16-bit signed integer.
///
/// Clamps to [-1.0, 1.0], then scales by 32767 for non-negative samples and
/// 32768 for negative ones. The asymmetric scaling is a wire-compatibility
/// requirement; collapsing it to a single constant changes the byte output.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode capture chunks as a complete WAV byte stream
///
/// Chunks are flattened in order. Zero chunks is valid and produces a
/// 44-byte stream describing zero-length data.
///
/// # Errors
///
/// Returns error if the sample rate is zero or container writing fails
pub fn encode_wav(chunks: &[Vec<f32>], sample_rate: u32) -> Result<Vec<u8>> {
    if sample_rate == 0 {
        return Err(Error::Audio("sample rate must be positive".to_string()));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for chunk in chunks {
            for &sample in chunk {
                writer
                    .write_sample(sample_to_i16(sample))
                    .map_err(|e| Error::Audio(e.to_string()))?;
            }
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    let data = cursor.into_inner();
    tracing::debug!(
        bytes = data.len(),
        sample_rate,
        chunks = chunks.len(),
        "encoded wav"
    );
    Ok(data)
}
