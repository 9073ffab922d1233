//! Float channel buffers → 16-bit PCM WAV bytes.
//!
//! ```text
//! per-channel f32 ──downsample?──▶ interleave ──quantize──▶ header + PCM16
//! ```
//!
//! Encoding works on copies; the caller's buffers are never modified.

use std::path::Path;

use super::header::{WavDescriptor, WavError, HEADER_LEN};
use super::resample::downsample_channels;

// ---------------------------------------------------------------------------
// Sample conversion
// ---------------------------------------------------------------------------

/// Quantize one float sample to signed 16-bit.
///
/// The input is clamped to `[-1.0, 1.0]`; negative values scale by 32768,
/// the rest by 32767, both rounded to nearest.
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32_768.0).round() as i16
    } else {
        (s * 32_767.0).round() as i16
    }
}

/// Merge per-channel arrays into one interleaved sequence.
///
/// Mono passes through; stereo becomes `L, R, L, R, …`.  Wider layouts are
/// refused rather than guessed at.
pub fn interleave(channels: &[Vec<f32>]) -> Result<Vec<f32>, WavError> {
    match channels {
        [mono] => Ok(mono.clone()),
        [left, right] => {
            let mut out = Vec::with_capacity(left.len() + right.len());
            for (&l, &r) in left.iter().zip(right) {
                out.push(l);
                out.push(r);
            }
            Ok(out)
        }
        other => Err(WavError::UnsupportedChannelLayout {
            channels: other.len(),
        }),
    }
}

/// Split an interleaved sequence back into channels.
pub fn deinterleave(samples: &[f32], channel_count: usize) -> Vec<Vec<f32>> {
    let channel_count = channel_count.max(1);
    let mut channels = vec![Vec::with_capacity(samples.len() / channel_count); channel_count];
    for frame in samples.chunks_exact(channel_count) {
        for (ch, &s) in channels.iter_mut().zip(frame) {
            ch.push(s);
        }
    }
    channels
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn write_wav(interleaved: &[f32], sample_rate: u32, channel_count: u16) -> Result<Vec<u8>, WavError> {
    let descriptor = WavDescriptor::pcm16(sample_rate, channel_count, interleaved.len())?;
    let mut out = Vec::with_capacity(HEADER_LEN + interleaved.len() * 2);
    descriptor.write_to(&mut out);
    for &s in interleaved {
        out.extend_from_slice(&quantize(s).to_le_bytes());
    }
    Ok(out)
}

/// Encode interleaved samples as a PCM16 WAV file.
///
/// `channel_count` must be 1 or 2 and `interleaved` must hold a whole
/// number of sample frames.
///
/// When `downsample_to` is set and lower than `sample_rate` the samples are
/// block-averaged first (per channel) and the header carries the target
/// rate.
///
/// # Example
///
/// ```rust
/// use speech_recorder::wav::{decode_header, encode};
///
/// let bytes = encode(&[0.0; 12], 8, 1, None).unwrap();
/// assert_eq!(bytes.len(), 44 + 24);
/// assert_eq!(decode_header(&bytes).unwrap().data_len, 24);
/// ```
pub fn encode(
    interleaved: &[f32],
    sample_rate: u32,
    channel_count: u16,
    downsample_to: Option<u32>,
) -> Result<Vec<u8>, WavError> {
    let channels = channel_count as usize;
    if !(1..=2).contains(&channels) {
        return Err(WavError::UnsupportedChannelLayout { channels });
    }
    if interleaved.len() % channels != 0 {
        return Err(WavError::RaggedInterleave {
            len: interleaved.len(),
            channels,
        });
    }

    match downsample_to {
        Some(target) if target != sample_rate => {
            let planar = deinterleave(interleaved, channels);
            encode_channels(&planar, sample_rate, Some(target))
        }
        _ => write_wav(interleaved, sample_rate, channel_count),
    }
}

/// Encode per-channel buffers as a PCM16 WAV file.
pub fn encode_channels(
    channels: &[Vec<f32>],
    sample_rate: u32,
    downsample_to: Option<u32>,
) -> Result<Vec<u8>, WavError> {
    let (rate, interleaved) = match downsample_to {
        Some(target) if target != 0 && target < sample_rate => {
            let reduced = downsample_channels(channels, sample_rate, target);
            (target, interleave(&reduced)?)
        }
        _ => (sample_rate, interleave(channels)?),
    };
    write_wav(&interleaved, rate, channels.len() as u16)
}

// ---------------------------------------------------------------------------
// WavBlob
// ---------------------------------------------------------------------------

/// An encoded WAV file tagged with the MIME type it was requested as.
#[derive(Debug, Clone, PartialEq)]
pub struct WavBlob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl WavBlob {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Header fields of the encoded file.
    pub fn descriptor(&self) -> Result<WavDescriptor, WavError> {
        super::header::decode_header(&self.bytes)
    }

    /// Write the bytes to `path`, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::header::{decode_header, decode_pcm16};
    use std::io::Cursor;

    #[test]
    fn quantize_scales_asymmetrically() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 32_767);
        assert_eq!(quantize(-1.0), -32_768);
        assert_eq!(quantize(0.5), 16_384); // 16383.5 rounds away from zero
        assert_eq!(quantize(-0.5), -16_384);
    }

    #[test]
    fn quantize_clamps_out_of_range() {
        assert_eq!(quantize(1.7), 32_767);
        assert_eq!(quantize(-3.0), -32_768);
    }

    #[test]
    fn interleave_stereo() {
        let out = interleave(&[vec![1.0, 2.0], vec![-1.0, -2.0]]).unwrap();
        assert_eq!(out, vec![1.0, -1.0, 2.0, -2.0]);
    }

    #[test]
    fn interleave_mono_passthrough() {
        assert_eq!(interleave(&[vec![0.3, 0.4]]).unwrap(), vec![0.3, 0.4]);
    }

    #[test]
    fn interleave_refuses_wide_layouts() {
        let err = interleave(&[vec![0.0], vec![0.0], vec![0.0]]).unwrap_err();
        assert_eq!(err, WavError::UnsupportedChannelLayout { channels: 3 });
    }

    #[test]
    fn three_silent_mono_frames() {
        // frame length 4, one channel, 8 Hz, three frames of zeros.
        let bytes = encode(&[0.0; 12], 8, 1, None).unwrap();
        assert_eq!(bytes.len(), 68);

        let desc = decode_header(&bytes).unwrap();
        assert_eq!(desc.data_len, 24);
        assert_eq!(desc.chunk_size(), 60);
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 60);
        assert!(bytes[44..].iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_input_is_a_valid_file() {
        let bytes = encode(&[], 44_100, 2, None).unwrap();
        assert_eq!(bytes.len(), 44);
        let desc = decode_header(&bytes).unwrap();
        assert_eq!(desc.data_len, 0);
        assert_eq!(desc.channel_count, 2);
    }

    #[test]
    fn header_matches_input_for_various_layouts() {
        for &(rate, channels, count) in &[(8_000u32, 1u16, 0usize), (16_000, 1, 33), (44_100, 2, 64), (48_000, 2, 2)] {
            let samples = vec![0.25_f32; count];
            let desc = decode_header(&encode(&samples, rate, channels, None).unwrap()).unwrap();
            assert_eq!(desc, WavDescriptor::pcm16(rate, channels, count).unwrap());
        }
    }

    #[test]
    fn ragged_interleave_is_rejected() {
        let expected = WavError::RaggedInterleave { len: 3, channels: 2 };
        assert_eq!(encode(&[0.1; 3], 8, 2, None), Err(expected.clone()));
        assert_eq!(encode(&[0.1; 3], 8, 2, Some(4)), Err(expected));
    }

    #[test]
    fn channel_count_checked_before_downsampling() {
        for downsample_to in [None, Some(4)] {
            assert_eq!(
                encode(&[0.0; 4], 8, 0, downsample_to),
                Err(WavError::UnsupportedChannelLayout { channels: 0 })
            );
            assert_eq!(
                encode(&[0.0; 6], 8, 3, downsample_to),
                Err(WavError::UnsupportedChannelLayout { channels: 3 })
            );
        }
    }

    #[test]
    fn stereo_output_is_whole_frames() {
        let bytes = encode(&[0.1; 6], 8, 2, None).unwrap();
        let desc = decode_header(&bytes).unwrap();
        assert_eq!(desc.data_len % desc.block_align() as u32, 0);
        assert!(hound::WavReader::new(Cursor::new(bytes)).is_ok());
    }

    #[test]
    fn round_trip_within_quantization_error() {
        let samples: Vec<f32> = (0..200).map(|i| ((i as f32) * 0.1).sin() * 0.9).collect();
        let decoded = decode_pcm16(&encode(&samples, 16_000, 1, None).unwrap()).unwrap();
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in samples.iter().zip(&decoded) {
            assert!((a - b).abs() <= 1.0 / 32_768.0, "{a} vs {b}");
        }
    }

    #[test]
    fn downsample_changes_header_rate_and_length() {
        let bytes = encode(&[1.0, 1.0, 0.0, 0.0], 4, 1, Some(2)).unwrap();
        let desc = decode_header(&bytes).unwrap();
        assert_eq!(desc.sample_rate, 2);
        assert_eq!(desc.data_len, 4);
        assert_eq!(decode_pcm16(&bytes).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn stereo_downsample_keeps_channels_apart() {
        // L = 1, R = -1 throughout.
        let interleaved = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let bytes = encode(&interleaved, 4, 2, Some(2)).unwrap();
        assert_eq!(decode_pcm16(&bytes).unwrap(), vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn encode_does_not_modify_input() {
        let channels = vec![vec![0.5_f32, 0.25, 0.125, 0.0]];
        let snapshot = channels.clone();
        encode_channels(&channels, 4, Some(2)).unwrap();
        assert_eq!(channels, snapshot);
    }

    #[test]
    fn hound_reads_encoded_stereo() {
        let bytes = encode_channels(&[vec![0.5, -0.5], vec![0.25, -0.25]], 22_050, None).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![16_384, 8_192, -16_384, -8_192]);
    }

    #[test]
    fn blob_write_to_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.wav");
        let blob = WavBlob::new("audio/wav", encode(&[0.0; 4], 8, 1, None).unwrap());
        blob.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), blob.bytes);
        assert_eq!(blob.descriptor().unwrap().data_len, 8);
    }
}
