//! WAV export: block-average downsampling, interleaving and PCM16
//! serialization.
//!
//! # Pipeline
//!
//! ```text
//! ChannelBuffers → downsample (optional) → interleave → quantize → RIFF/WAVE
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use speech_recorder::wav::{decode_header, encode_channels};
//!
//! let left = vec![0.0_f32; 8];
//! let right = vec![0.0_f32; 8];
//! let bytes = encode_channels(&[left, right], 8_000, None).unwrap();
//!
//! let desc = decode_header(&bytes).unwrap();
//! assert_eq!(desc.channel_count, 2);
//! assert_eq!(desc.data_len, 32);
//! ```

pub mod encoder;
pub mod header;
pub mod resample;

pub use encoder::{deinterleave, encode, encode_channels, interleave, quantize, WavBlob};
pub use header::{decode_header, decode_pcm16, WavDescriptor, WavError, HEADER_LEN, MAX_DATA_LEN};
pub use resample::{downsample, downsample_channels};
