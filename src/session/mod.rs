//! Recording session: frame gating, silence edges, backfill and the
//! background worker that owns the samples.
//!
//! # Architecture
//!
//! ```text
//! audio thread ──process_frame──▶ RecordingSession ──Command (mpsc)──▶ Worker
//!                                  │  SilenceTracker                   │ SampleBuffer
//!                                  │  edge listeners                   │ encode (spawn_blocking)
//!                                  │                                   ▼
//!                                  └── PendingRequests ◀──Response── dispatch task
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use speech_recorder::config::RecorderConfig;
//! use speech_recorder::session::RecordingSession;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = RecordingSession::spawn(RecorderConfig::default(), 48_000).unwrap();
//!     session.record();
//!     // ... feed frames with session.process_frame(frame, amplitude_byte) ...
//!     session.stop();
//!     let wav = session.export_wav(None).await.unwrap();
//!     wav.write_to(std::path::Path::new("out.wav")).unwrap();
//! }
//! ```

pub mod recorder;
pub mod requests;
pub mod state;
mod worker;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use recorder::{
    DefaultBufferCallback, DefaultWavCallback, EdgeListener, RecorderError, RecordingSession,
};
pub use requests::{BufferCallback, RequestId, WavCallback};
pub use state::RecorderState;
