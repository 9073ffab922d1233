//! Audio front end: device capture, frame slicing, silence tracking and
//! per-channel buffering.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → FrameAssembler → (FrameSet, amplitude byte)
//!           → RecordingSession → SilenceTracker / SampleBuffer
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use speech_recorder::audio::{AudioCapture, CapturedFrame};
//!
//! let (tx, rx) = mpsc::channel::<CapturedFrame>();
//! let capture = AudioCapture::new(None).unwrap();
//! let _handle = capture.start(2, 4096, 2048, tx).unwrap(); // drop handle → stops stream
//!
//! while let Ok(captured) = rx.recv() {
//!     println!("{} samples per channel", captured.frame.len());
//! }
//! ```

pub mod buffer;
pub mod capture;
pub mod frame;
pub mod silence;

pub use buffer::{ChannelBuffers, SampleBuffer};
pub use capture::{fit_channels, AudioCapture, CaptureError, CapturedFrame, StreamHandle};
pub use frame::{amplitude_byte, normalize_amplitude, FrameAssembler, FrameSet};
pub use silence::{Edge, HeldFrames, SilenceTracker, DEFAULT_SILENCE_DURATION, DEFAULT_SILENCE_THRESHOLD};
