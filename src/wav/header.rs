//! Canonical 44-byte RIFF/WAVE header for 16-bit linear PCM.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0  | 4 | `RIFF` |
//! | 4  | 4 | chunk size = 36 + data length |
//! | 8  | 4 | `WAVE` |
//! | 12 | 4 | `fmt ` |
//! | 16 | 4 | 16 |
//! | 20 | 2 | 1 (PCM) |
//! | 22 | 2 | channel count |
//! | 24 | 4 | sample rate |
//! | 28 | 4 | byte rate = rate × channels × 2 |
//! | 32 | 2 | block align = channels × 2 |
//! | 34 | 2 | 16 |
//! | 36 | 4 | `data` |
//! | 40 | 4 | data length in bytes |
//!
//! All integers are little-endian.

use thiserror::Error;

pub const HEADER_LEN: usize = 44;
pub const BITS_PER_SAMPLE: u16 = 16;
const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;
/// Header bytes counted by the RIFF chunk size (everything after offset 8
/// up to the PCM payload).
const RIFF_OVERHEAD: u32 = 36;
/// Largest `data` chunk whose RIFF chunk size still fits in 32 bits.
pub const MAX_DATA_LEN: u32 = u32::MAX - RIFF_OVERHEAD;

// ---------------------------------------------------------------------------
// WavError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WavError {
    #[error("cannot interleave {channels} channels (only mono and stereo are supported)")]
    UnsupportedChannelLayout { channels: usize },

    #[error("WAV data truncated: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("expected `{expected}` at offset {offset}")]
    BadTag { expected: &'static str, offset: usize },

    #[error("unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    #[error("{len} interleaved samples do not divide into {channels} channels")]
    RaggedInterleave { len: usize, channels: usize },

    #[error("{samples} samples exceed the 4 GiB WAV size limit")]
    TooLarge { samples: usize },
}

// ---------------------------------------------------------------------------
// WavDescriptor
// ---------------------------------------------------------------------------

/// The header fields that vary between exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavDescriptor {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub bits_per_sample: u16,
    /// Length of the `data` chunk in bytes.
    pub data_len: u32,
}

impl WavDescriptor {
    /// Descriptor for `sample_count` interleaved PCM16 samples.
    ///
    /// Fails when the RIFF chunk size would not fit in 32 bits.
    pub fn pcm16(sample_rate: u32, channel_count: u16, sample_count: usize) -> Result<Self, WavError> {
        let data_len = sample_count
            .checked_mul(2)
            .and_then(|bytes| u32::try_from(bytes).ok())
            .filter(|&bytes| bytes <= MAX_DATA_LEN)
            .ok_or(WavError::TooLarge {
                samples: sample_count,
            })?;
        Ok(Self {
            sample_rate,
            channel_count,
            bits_per_sample: BITS_PER_SAMPLE,
            data_len,
        })
    }

    pub fn block_align(&self) -> u16 {
        self.channel_count.saturating_mul(self.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(self.block_align() as u32)
    }

    /// RIFF chunk size field.  Saturates for `data_len` above
    /// [`MAX_DATA_LEN`], which [`pcm16`](Self::pcm16) never produces.
    pub fn chunk_size(&self) -> u32 {
        RIFF_OVERHEAD.saturating_add(self.data_len)
    }

    /// Append the 44 header bytes to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&self.chunk_size().to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&self.channel_count.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.byte_rate().to_le_bytes());
        out.extend_from_slice(&self.block_align().to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());

        out.extend_from_slice(b"data");
        out.extend_from_slice(&self.data_len.to_le_bytes());
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn expect_tag(bytes: &[u8], offset: usize, tag: &'static str) -> Result<(), WavError> {
    if &bytes[offset..offset + 4] != tag.as_bytes() {
        return Err(WavError::BadTag {
            expected: tag,
            offset,
        });
    }
    Ok(())
}

/// Parse the canonical header produced by this crate's encoder.
///
/// Only the fixed 44-byte PCM layout is accepted; files with extra chunks
/// are rejected with [`WavError::UnsupportedFormat`].
pub fn decode_header(bytes: &[u8]) -> Result<WavDescriptor, WavError> {
    if bytes.len() < HEADER_LEN {
        return Err(WavError::Truncated {
            needed: HEADER_LEN,
            got: bytes.len(),
        });
    }

    expect_tag(bytes, 0, "RIFF")?;
    expect_tag(bytes, 8, "WAVE")?;
    expect_tag(bytes, 12, "fmt ")?;
    expect_tag(bytes, 36, "data")?;

    let fmt_len = read_u32(bytes, 16);
    if fmt_len != FMT_CHUNK_LEN {
        return Err(WavError::UnsupportedFormat(format!(
            "fmt chunk length {fmt_len}"
        )));
    }
    let format = read_u16(bytes, 20);
    if format != FORMAT_PCM {
        return Err(WavError::UnsupportedFormat(format!("format tag {format}")));
    }
    let bits_per_sample = read_u16(bytes, 34);
    if bits_per_sample != BITS_PER_SAMPLE {
        return Err(WavError::UnsupportedFormat(format!(
            "{bits_per_sample} bits per sample"
        )));
    }

    let descriptor = WavDescriptor {
        sample_rate: read_u32(bytes, 24),
        channel_count: read_u16(bytes, 22),
        bits_per_sample,
        data_len: read_u32(bytes, 40),
    };

    if descriptor.data_len > MAX_DATA_LEN {
        return Err(WavError::UnsupportedFormat(format!(
            "data length {} exceeds the RIFF limit",
            descriptor.data_len
        )));
    }
    if read_u32(bytes, 4) != descriptor.chunk_size() {
        return Err(WavError::UnsupportedFormat(
            "RIFF chunk size does not match data length".into(),
        ));
    }

    Ok(descriptor)
}

/// Decode the PCM16 payload back to floats.
///
/// Negative values are scaled by 1/32768 and positive values by 1/32767,
/// mirroring the encoder's quantization.
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<f32>, WavError> {
    let descriptor = decode_header(bytes)?;
    let end = HEADER_LEN + descriptor.data_len as usize;
    if bytes.len() < end {
        return Err(WavError::Truncated {
            needed: end,
            got: bytes.len(),
        });
    }

    Ok(bytes[HEADER_LEN..end]
        .chunks_exact(2)
        .map(|pair| {
            let v = i16::from_le_bytes([pair[0], pair[1]]);
            if v < 0 {
                v as f32 / 32_768.0
            } else {
                v as f32 / 32_767.0
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
