//! Recording session: the control surface of the recorder.
//!
//! [`RecordingSession`] receives frames from the audio callback, runs the
//! live [`SilenceTracker`] so edge listeners fire without a round trip, and
//! forwards accepted frames to the background [`Worker`] that owns the
//! sample buffer.
//!
//! # Frame flow
//!
//! ```text
//! process_frame(frame, amplitude)
//!   └─▶ analysis gate closed?  → discard
//!   └─▶ SilenceTracker::observe → on_silence / on_exit_silence
//!   └─▶ not recording?         → hold frame (two-slot backfill window)
//!   └─▶ recording              → Record(held previous), Record(held current),
//!                                Record(live frame)
//! ```
//!
//! All methods take `&self`, so the session can sit behind an `Arc` shared
//! by the audio thread and the controlling code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::requests::{dispatch, BufferCallback, Pending, PendingRequests, RequestId, WavCallback};
use super::state::RecorderState;
use super::worker::{Command, Worker, WorkerConfig};
use crate::audio::{normalize_amplitude, ChannelBuffers, Edge, FrameSet, SilenceTracker};
use crate::config::{ConfigError, RecorderConfig};
use crate::wav::{WavBlob, WavError};

// ---------------------------------------------------------------------------
// RecorderError
// ---------------------------------------------------------------------------

/// Errors surfaced by [`RecordingSession`].
#[derive(Debug, Error)]
pub enum RecorderError {
    /// An asynchronous request was made without a callback and no default
    /// callback is configured.
    #[error("no callback supplied for `{command}` and no default callback set")]
    MissingCallback { command: &'static str },

    /// A frame's channel count does not match the session.
    #[error("frame has {got} channel(s), session records {expected}")]
    FrameLayout { expected: usize, got: usize },

    /// The worker task is gone (runtime shut down).
    #[error("recording worker has shut down")]
    WorkerGone,

    #[error("recording worker received `{0}` before init")]
    NotInitialized(&'static str),

    #[error("a tokio runtime is required to start a session: {0}")]
    NoRuntime(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wav(#[from] WavError),

    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Callback types
// ---------------------------------------------------------------------------

/// Listener for silence edges.
pub type EdgeListener = Arc<dyn Fn() + Send + Sync>;

/// Fallback used by [`RecordingSession::request_buffer`] when no callback
/// is passed.
pub type DefaultBufferCallback = Arc<dyn Fn(ChannelBuffers) + Send + Sync>;

/// Fallback used by [`RecordingSession::request_wav`] when no callback is
/// passed.
pub type DefaultWavCallback = Arc<dyn Fn(Result<WavBlob, RecorderError>) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// RecordingSession
// ---------------------------------------------------------------------------

/// Drives one recording from the first frame to the exported WAV.
///
/// Create with [`RecordingSession::spawn`] from inside a tokio runtime.
///
/// ```rust,no_run
/// use speech_recorder::audio::FrameSet;
/// use speech_recorder::config::RecorderConfig;
/// use speech_recorder::session::RecordingSession;
///
/// # async fn example() -> Result<(), speech_recorder::session::RecorderError> {
/// let session = RecordingSession::spawn(RecorderConfig::default(), 44_100)?;
/// session.on_silence(|| println!("silence"));
/// session.record();
///
/// // Called from the audio callback for every frame:
/// session.process_frame(FrameSet::silent(2, 4096), 128)?;
///
/// let wav = session.export_wav(None).await?;
/// println!("{} bytes of {}", wav.len(), wav.mime_type);
/// # Ok(())
/// # }
/// ```
pub struct RecordingSession {
    config: RecorderConfig,
    sample_rate: u32,
    recording: AtomicBool,
    recording_all: AtomicBool,
    tracker: Mutex<SilenceTracker>,
    on_silence: Mutex<Option<EdgeListener>>,
    on_exit_silence: Mutex<Option<EdgeListener>>,
    default_buffer_callback: Mutex<Option<DefaultBufferCallback>>,
    default_wav_callback: Mutex<Option<DefaultWavCallback>>,
    commands: mpsc::UnboundedSender<Command>,
    pending: Arc<PendingRequests>,
}

impl RecordingSession {
    /// Validate `config`, start the worker and reply dispatcher on the
    /// current tokio runtime, and return an idle session.
    ///
    /// `sample_rate` is the device rate; it is fixed for the session's
    /// lifetime.
    pub fn spawn(config: RecorderConfig, sample_rate: u32) -> Result<Self, RecorderError> {
        config.validate(sample_rate)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RecorderError::NoRuntime(e.to_string()))?;

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingRequests::default());

        runtime.spawn(Worker::new(response_tx).run(command_rx));
        runtime.spawn(dispatch(Arc::clone(&pending), response_rx));

        commands
            .send(Command::Init(WorkerConfig {
                sample_rate,
                channel_count: config.channel_count,
                downsample_to: config.downsample_to,
            }))
            .map_err(|_| RecorderError::WorkerGone)?;

        log::info!(
            "session: started ({} Hz, {} ch, frame {} samples)",
            sample_rate,
            config.channel_count,
            config.frame_length
        );

        let tracker = SilenceTracker::new(
            config.silence_threshold,
            config.silence_duration(),
            Instant::now(),
        );

        Ok(Self {
            config,
            sample_rate,
            recording: AtomicBool::new(false),
            recording_all: AtomicBool::new(false),
            tracker: Mutex::new(tracker),
            on_silence: Mutex::new(None),
            on_exit_silence: Mutex::new(None),
            default_buffer_callback: Mutex::new(None),
            default_wav_callback: Mutex::new(None),
            commands,
            pending,
        })
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Start analysing and persisting frames.
    pub fn record(&self) {
        self.recording.store(true, Ordering::Release);
        self.recording_all.store(true, Ordering::Release);
        self.restart_timer_unless_listening();
        log::debug!("session: record");
    }

    /// Stop persisting frames.  Analysis keeps running if it was running,
    /// so edge listeners still fire.
    pub fn stop(&self) {
        self.recording.store(false, Ordering::Release);
        log::debug!("session: stop");
    }

    /// Ignore frames entirely (no analysis, no buffering).
    pub fn pause(&self) {
        self.recording_all.store(false, Ordering::Release);
        log::debug!("session: pause");
    }

    /// Undo [`pause`](Self::pause).
    pub fn resume(&self) {
        self.recording_all.store(true, Ordering::Release);
        self.restart_timer_unless_listening();
        log::debug!("session: resume");
    }

    /// With no exit listener registered the tracker restarts as "not in
    /// silence".
    fn restart_timer_unless_listening(&self) {
        if lock(&self.on_exit_silence).is_none() {
            lock(&self.tracker).restart(false);
        }
    }

    /// Drop all buffered audio, reset the tracker to "in silence" and
    /// discard held frames.
    pub fn clear(&self) -> Result<(), RecorderError> {
        lock(&self.tracker).reset(true);
        self.send(Command::Clear)
    }

    // -----------------------------------------------------------------------
    // Frame ingestion
    // -----------------------------------------------------------------------

    /// Handle one frame from the audio callback.
    ///
    /// Never blocks on buffering or encoding.
    pub fn process_frame(&self, frame: FrameSet, amplitude_byte: u8) -> Result<(), RecorderError> {
        self.process_frame_at(frame, amplitude_byte, Instant::now())
    }

    /// [`process_frame`](Self::process_frame) with an explicit timestamp.
    pub fn process_frame_at(
        &self,
        frame: FrameSet,
        amplitude_byte: u8,
        now: Instant,
    ) -> Result<(), RecorderError> {
        if !self.recording_all.load(Ordering::Acquire) {
            return Ok(());
        }

        let expected = self.config.channel_count as usize;
        if frame.channel_count() != expected {
            return Err(RecorderError::FrameLayout {
                expected,
                got: frame.channel_count(),
            });
        }

        let amplitude = normalize_amplitude(amplitude_byte);
        // The analysis gate is open here, so this is Armed or Idle.
        let recording = self.state().is_persisting();

        let (edge, outgoing) = {
            let mut tracker = lock(&self.tracker);
            let edge = tracker.observe_at(amplitude, now);
            if recording {
                let mut outgoing: Vec<FrameSet> = tracker.take_held().into_iter().collect();
                outgoing.push(frame);
                (edge, outgoing)
            } else {
                tracker.hold(frame);
                (edge, Vec::new())
            }
        };

        self.fire(edge);

        if outgoing.len() > 1 {
            log::debug!("session: backfilling {} held frame(s)", outgoing.len() - 1);
        }
        for frame in outgoing {
            self.send(Command::Record(frame))?;
        }
        Ok(())
    }

    fn fire(&self, edge: Edge) {
        let listener = match edge {
            Edge::None => return,
            Edge::EnteredSilence => {
                log::debug!("session: entered silence");
                lock(&self.on_silence).clone()
            }
            Edge::ExitedSilence => {
                log::debug!("session: exited silence");
                lock(&self.on_exit_silence).clone()
            }
        };
        if let Some(listener) = listener {
            listener();
        }
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Call `listener` whenever the input goes quiet for longer than the
    /// silence duration.
    pub fn on_silence(&self, listener: impl Fn() + Send + Sync + 'static) {
        *lock(&self.on_silence) = Some(Arc::new(listener));
    }

    /// Call `listener` when a loud frame ends a silence.
    pub fn on_exit_silence(&self, listener: impl Fn() + Send + Sync + 'static) {
        *lock(&self.on_exit_silence) = Some(Arc::new(listener));
    }

    pub fn set_default_buffer_callback(&self, callback: impl Fn(ChannelBuffers) + Send + Sync + 'static) {
        *lock(&self.default_buffer_callback) = Some(Arc::new(callback));
    }

    pub fn set_default_wav_callback(
        &self,
        callback: impl Fn(Result<WavBlob, RecorderError>) + Send + Sync + 'static,
    ) {
        *lock(&self.default_wav_callback) = Some(Arc::new(callback));
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Ask for the merged per-channel buffers.
    ///
    /// `callback` (or the default buffer callback) is invoked once with the
    /// snapshot.  The returned id identifies this request.
    pub fn request_buffer(&self, callback: Option<BufferCallback>) -> Result<RequestId, RecorderError> {
        let callback: BufferCallback = match callback {
            Some(cb) => cb,
            None => {
                let fallback = lock(&self.default_buffer_callback)
                    .clone()
                    .ok_or(RecorderError::MissingCallback {
                        command: "get_buffer",
                    })?;
                Box::new(move |buffers: ChannelBuffers| fallback(buffers))
            }
        };

        let id = self.pending.register(Pending::Buffer(callback));
        self.send_request(id, Command::GetBuffer { id })
    }

    /// Ask for the recording encoded as WAV, tagged with `mime_type` (or the
    /// configured default).
    pub fn request_wav(
        &self,
        callback: Option<WavCallback>,
        mime_type: Option<&str>,
    ) -> Result<RequestId, RecorderError> {
        let callback: WavCallback = match callback {
            Some(cb) => cb,
            None => {
                let fallback = lock(&self.default_wav_callback)
                    .clone()
                    .ok_or(RecorderError::MissingCallback {
                        command: "export_wav",
                    })?;
                Box::new(move |result: Result<WavBlob, RecorderError>| fallback(result))
            }
        };

        let mime_type = mime_type.unwrap_or(&self.config.mime_type).to_string();
        let id = self.pending.register(Pending::Wav(callback));
        self.send_request(id, Command::Export { id, mime_type })
    }

    /// Merged per-channel buffers.  Does not change the recording.
    pub async fn get_buffer(&self) -> Result<ChannelBuffers, RecorderError> {
        let (tx, rx) = oneshot::channel();
        self.request_buffer(Some(Box::new(move |buffers: ChannelBuffers| {
            let _ = tx.send(buffers);
        })))?;
        rx.await.map_err(|_| RecorderError::WorkerGone)
    }

    /// The recording encoded as a PCM16 WAV.
    pub async fn export_wav(&self, mime_type: Option<&str>) -> Result<WavBlob, RecorderError> {
        let (tx, rx) = oneshot::channel();
        self.request_wav(
            Some(Box::new(move |result: Result<WavBlob, RecorderError>| {
                let _ = tx.send(result);
            })),
            mime_type,
        )?;
        rx.await.map_err(|_| RecorderError::WorkerGone)?
    }

    fn send_request(&self, id: RequestId, command: Command) -> Result<RequestId, RecorderError> {
        if let Err(e) = self.send(command) {
            self.pending.cancel(id);
            return Err(e);
        }
        Ok(id)
    }

    fn send(&self, command: Command) -> Result<(), RecorderError> {
        self.commands
            .send(command)
            .map_err(|_| RecorderError::WorkerGone)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> RecorderState {
        RecorderState::from_flags(
            self.recording.load(Ordering::Acquire),
            self.recording_all.load(Ordering::Acquire),
        )
    }

    pub fn is_in_silence(&self) -> bool {
        lock(&self.tracker).is_in_silence()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
