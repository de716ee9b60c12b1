//! WAV encoder properties
//!
//! Byte-level checks of the 44-byte header and the asymmetric sample
//! conversion.

use std::io::Cursor;

use voca::audio::{encode_wav, sample_to_i16};

mod common;
use common::generate_sine_samples;

const SAMPLE_RATE: u32 = 16_000;

#[test]
fn data_length_is_twice_total_samples() {
    let chunks = vec![vec![0.1f32; 100], vec![0.2f32; 250], vec![0.3f32; 7]];
    let total: usize = chunks.iter().map(Vec::len).sum();

    let wav = encode_wav(&chunks, SAMPLE_RATE).expect("encode");
    assert_eq!(wav.len(), 44 + 2 * total);

    // Declared data chunk size matches the payload
    let declared = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
    assert_eq!(declared as usize, 2 * total);
}

#[test]
fn zero_chunks_yields_exactly_44_bytes() {
    let wav = encode_wav(&[], SAMPLE_RATE).expect("encode");
    assert_eq!(wav.len(), 44);

    // Data size zero, RIFF size 36
    assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 0);
    assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36);
}

#[test]
fn header_fields_for_three_chunk_recording() {
    // 4096 + 4096 + 2048 samples at 16 kHz
    let chunks = vec![vec![0.0f32; 4096], vec![0.0f32; 4096], vec![0.0f32; 2048]];
    let wav = encode_wav(&chunks, SAMPLE_RATE).expect("encode");

    assert_eq!(wav.len(), 44 + 2 * 10_240);
    assert_eq!(wav.len(), 20_524);

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");

    // RIFF size = 36 + 2n
    assert_eq!(
        u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]),
        36 + 2 * 10_240
    );
    // PCM format tag, mono
    assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 1);
    assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
    // Sample rate at bytes 24-27
    assert_eq!(
        u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]),
        16_000
    );
    // Byte rate = rate * 2, block align = 2
    assert_eq!(
        u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]),
        32_000
    );
    assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 2);
    // Bits per sample at bytes 34-35
    assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
}

#[test]
fn quantization_round_trip_within_one_step() {
    let samples = generate_sine_samples(SAMPLE_RATE, 440.0, 0.05, 1.2);

    for &sample in &samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let quantized = sample_to_i16(sample);

        // Recover using the matching per-sign divisor
        let recovered = if quantized < 0 {
            f32::from(quantized) / 32_768.0
        } else {
            f32::from(quantized) / 32_767.0
        };

        assert!(
            (recovered - clamped).abs() <= 1.0 / 32_767.0,
            "sample {sample} quantized to {quantized}, recovered {recovered}"
        );
    }
}

#[test]
fn samples_survive_container_round_trip() {
    let chunk: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav = encode_wav(&[chunk.clone()], SAMPLE_RATE).expect("encode");

    let mut reader = hound::WavReader::new(Cursor::new(wav)).expect("read wav");
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.expect("sample")).collect();
    let expected: Vec<i16> = chunk.iter().map(|&s| sample_to_i16(s)).collect();
    assert_eq!(decoded, expected);
    assert_eq!(decoded, vec![0, 16383, -16384, 32767, -32768, 8191]);
}

#[test]
fn chunk_order_is_preserved() {
    let chunks = vec![vec![0.25f32; 3], vec![-0.75f32; 2], vec![1.0f32; 1]];
    let wav = encode_wav(&chunks, SAMPLE_RATE).expect("encode");

    let mut reader = hound::WavReader::new(Cursor::new(wav)).expect("read wav");
    let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.expect("sample")).collect();

    let flat: Vec<i16> = chunks
        .iter()
        .flatten()
        .map(|&s| sample_to_i16(s))
        .collect();
    assert_eq!(decoded, flat);
}
