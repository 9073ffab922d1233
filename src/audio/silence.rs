//! Silence / speech edge detection over a per-frame amplitude sample.
//!
//! [`SilenceTracker`] receives one amplitude value per frame.  A value whose
//! magnitude exceeds the threshold counts as *loud* and restarts the
//! loudness timer.  Once the timer has run longer than the silence duration
//! the tracker is *in silence*.  Only the transitions are reported, as
//! [`Edge`]s, so listeners fire once per change.
//!
//! ## Held frames
//!
//! The tracker also keeps a two-slot window of frames that were analysed
//! but not persisted.  When persistence starts those frames are taken and
//! written ahead of the live frame so an utterance onset is not cut off.

use std::time::{Duration, Instant};

use super::frame::FrameSet;

/// Default magnitude above which an amplitude sample is loud.
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.07;

/// Default quiet time before the tracker enters silence.
pub const DEFAULT_SILENCE_DURATION: Duration = Duration::from_millis(1500);

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Transition reported by [`SilenceTracker::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    EnteredSilence,
    ExitedSilence,
}

// ---------------------------------------------------------------------------
// HeldFrames
// ---------------------------------------------------------------------------

/// Frames retained for backfill, oldest in `previous`.
#[derive(Debug, Default, PartialEq)]
pub struct HeldFrames {
    pub previous: Option<FrameSet>,
    pub current: Option<FrameSet>,
}

impl HeldFrames {
    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.current.is_none()
    }
}

impl IntoIterator for HeldFrames {
    type Item = FrameSet;
    type IntoIter = std::iter::Flatten<std::array::IntoIter<Option<FrameSet>, 2>>;

    /// `previous` first, then `current`.
    fn into_iter(self) -> Self::IntoIter {
        [self.previous, self.current].into_iter().flatten()
    }
}

// ---------------------------------------------------------------------------
// SilenceTracker
// ---------------------------------------------------------------------------

/// Rolling silence state machine.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use speech_recorder::audio::{Edge, SilenceTracker};
///
/// let start = Instant::now();
/// let mut tracker = SilenceTracker::new(0.07, Duration::from_millis(100), start);
///
/// assert_eq!(tracker.observe_at(0.5, start), Edge::ExitedSilence);
/// let later = start + Duration::from_millis(150);
/// assert_eq!(tracker.observe_at(0.0, later), Edge::EnteredSilence);
/// ```
pub struct SilenceTracker {
    threshold: f32,
    silence_duration: Duration,
    last_loud: Instant,
    in_silence: bool,
    held: HeldFrames,
}

impl SilenceTracker {
    /// Create a tracker that starts *in silence* with its timer at `now`.
    pub fn new(threshold: f32, silence_duration: Duration, now: Instant) -> Self {
        Self {
            threshold,
            silence_duration,
            last_loud: now,
            in_silence: true,
            held: HeldFrames::default(),
        }
    }

    /// Feed one amplitude sample, timestamped with the current instant.
    pub fn observe(&mut self, amplitude: f32) -> Edge {
        self.observe_at(amplitude, Instant::now())
    }

    /// Feed one amplitude sample observed at `now`.
    pub fn observe_at(&mut self, amplitude: f32, now: Instant) -> Edge {
        let mut edge = Edge::None;

        if amplitude.abs() > self.threshold {
            if self.in_silence {
                edge = Edge::ExitedSilence;
            }
            self.in_silence = false;
            self.last_loud = now;
        }

        let elapsed = now.saturating_duration_since(self.last_loud);
        if elapsed > self.silence_duration {
            if !self.in_silence {
                edge = Edge::EnteredSilence;
            }
            self.in_silence = true;
        }

        edge
    }

    /// Retain `frame` for backfill, dropping the oldest held frame.
    pub fn hold(&mut self, frame: FrameSet) {
        self.held.previous = self.held.current.take();
        self.held.current = Some(frame);
    }

    /// Take the held frames, leaving the window empty.
    pub fn take_held(&mut self) -> HeldFrames {
        std::mem::take(&mut self.held)
    }

    /// Restart the loudness timer at `now` and set the silence state.
    ///
    /// Held frames are kept.
    pub fn restart_at(&mut self, in_silence: bool, now: Instant) {
        self.in_silence = in_silence;
        self.last_loud = now;
    }

    pub fn restart(&mut self, in_silence: bool) {
        self.restart_at(in_silence, Instant::now());
    }

    /// [`restart_at`](Self::restart_at) and drop any held frames.
    pub fn reset_at(&mut self, in_silence: bool, now: Instant) {
        self.restart_at(in_silence, now);
        self.held = HeldFrames::default();
    }

    pub fn reset(&mut self, in_silence: bool) {
        self.reset_at(in_silence, Instant::now());
    }

    pub fn is_in_silence(&self) -> bool {
        self.in_silence
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn silence_duration(&self) -> Duration {
        self.silence_duration
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
