//! Live speech recorder: fixed-size frame ingestion, silence detection with
//! onset backfill, per-channel buffering and PCM16 WAV export.
//!
//! * [`audio`]: cpal capture, frame slicing, [`audio::SilenceTracker`],
//!   [`audio::SampleBuffer`].
//! * [`session`]: [`session::RecordingSession`] and its worker task.
//! * [`wav`]: downsampling and the WAV encoder / header decoder.
//! * [`config`]: TOML settings and platform paths.

pub mod audio;
pub mod config;
pub mod session;
pub mod wav;
