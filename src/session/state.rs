//! Recorder state as seen from the control API.
//!
//! The session keeps two gates: `recording_all` (frames are analysed at
//! all) and `recording` (analysed frames are persisted).  [`RecorderState`]
//! folds them into the states a caller cares about:
//!
//! ```text
//! Idle ──record()──▶ Armed ──pause()──▶ Paused
//!                      ▲                  │
//!                      └────resume()──────┘
//! Armed / Paused ──stop()──▶ Idle
//! ```

/// Externally visible recorder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// Nothing is persisted.  Frames may still be analysed for silence
    /// edges if the analysis gate is open.
    #[default]
    Idle,

    /// Frames are analysed and persisted.
    Armed,

    /// Recording, but frames are currently discarded unseen.
    Paused,
}

impl RecorderState {
    /// Derive the state from the two session gates.
    pub fn from_flags(recording: bool, recording_all: bool) -> Self {
        match (recording, recording_all) {
            (false, _) => RecorderState::Idle,
            (true, true) => RecorderState::Armed,
            (true, false) => RecorderState::Paused,
        }
    }

    /// Returns `true` while incoming frames end up in the sample buffer.
    pub fn is_persisting(&self) -> bool {
        matches!(self, RecorderState::Armed)
    }

    /// A short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RecorderState::Idle => "Idle",
            RecorderState::Armed => "Recording",
            RecorderState::Paused => "Paused",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_states() {
        assert_eq!(RecorderState::from_flags(false, false), RecorderState::Idle);
        assert_eq!(RecorderState::from_flags(false, true), RecorderState::Idle);
        assert_eq!(RecorderState::from_flags(true, true), RecorderState::Armed);
        assert_eq!(RecorderState::from_flags(true, false), RecorderState::Paused);
    }

    #[test]
    fn only_armed_persists() {
        assert!(RecorderState::Armed.is_persisting());
        assert!(!RecorderState::Paused.is_persisting());
        assert!(!RecorderState::Idle.is_persisting());
    }

    #[test]
    fn labels() {
        assert_eq!(RecorderState::Idle.label(), "Idle");
        assert_eq!(RecorderState::Armed.label(), "Recording");
        assert_eq!(RecorderState::Paused.label(), "Paused");
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(RecorderState::default(), RecorderState::Idle);
    }
}
