//! Fixed-length multi-channel frames and the amplitude byte that travels
//! with each of them.
//!
//! The device delivers interleaved samples in whatever block size it likes.
//! [`FrameAssembler`] re-slices that stream into [`FrameSet`]s of exactly
//! `frame_length` samples per channel, which is the unit the recording
//! session works in.

// ---------------------------------------------------------------------------
// FrameSet
// ---------------------------------------------------------------------------

/// One processing tick worth of audio: one equally sized slice per channel.
///
/// Samples are `f32` in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    channels: Vec<Vec<f32>>,
}

impl FrameSet {
    /// Wrap per-channel slices.
    ///
    /// Returns `None` when `channels` is empty or the slices differ in
    /// length.
    pub fn new(channels: Vec<Vec<f32>>) -> Option<Self> {
        let first = channels.first()?.len();
        if channels.iter().any(|c| c.len() != first) {
            return None;
        }
        Some(Self { channels })
    }

    /// A frame of `len` zero samples on each of `channel_count` channels.
    pub fn silent(channel_count: usize, len: usize) -> Self {
        Self {
            channels: vec![vec![0.0; len]; channel_count.max(1)],
        }
    }

    /// Split interleaved samples into per-channel slices.
    ///
    /// Trailing samples that do not fill a whole sample frame are dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize) -> Option<Self> {
        if channel_count == 0 {
            return None;
        }
        let mut channels = vec![Vec::with_capacity(samples.len() / channel_count); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Some(Self { channels })
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples of channel `index`.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Give up ownership of the per-channel slices.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Mono downmix of sample `index` (mean across channels).
    fn mixed_sample(&self, index: usize) -> f32 {
        let sum: f32 = self.channels.iter().map(|c| c[index]).sum();
        sum / self.channels.len() as f32
    }
}

// ---------------------------------------------------------------------------
// Amplitude byte
// ---------------------------------------------------------------------------

/// Map an amplitude byte from the time-domain analyser to `[-1.0, 1.0)`.
///
/// `128` is the zero line: `(byte / 128) - 1.0`.
///
/// ```rust
/// use speech_recorder::audio::normalize_amplitude;
///
/// assert_eq!(normalize_amplitude(128), 0.0);
/// assert_eq!(normalize_amplitude(0), -1.0);
/// ```
pub fn normalize_amplitude(byte: u8) -> f32 {
    (byte as f32 / 128.0) - 1.0
}

/// Quantize a float sample to the unsigned byte scale used for amplitude bytes.
pub fn sample_to_amplitude_byte(sample: f32) -> u8 {
    (128.0 * (sample.clamp(-1.0, 1.0) + 1.0)).floor().clamp(0.0, 255.0) as u8
}

/// Amplitude byte for a frame.
///
/// Looks at the first sample of the trailing `window` samples of the mono
/// downmix, the same point a time-domain analyser of that window size would
/// report at index 0.
pub fn amplitude_byte(frame: &FrameSet, window: usize) -> u8 {
    if frame.is_empty() {
        return 128;
    }
    let index = frame.len().saturating_sub(window.max(1));
    sample_to_amplitude_byte(frame.mixed_sample(index))
}

// ---------------------------------------------------------------------------
// FrameAssembler
// ---------------------------------------------------------------------------

/// Re-slices an interleaved device stream into fixed-length [`FrameSet`]s.
pub struct FrameAssembler {
    frame_length: usize,
    channel_count: usize,
    pending: Vec<f32>,
}

impl FrameAssembler {
    /// # Panics
    ///
    /// Panics if `frame_length` or `channel_count` is zero.
    pub fn new(frame_length: usize, channel_count: usize) -> Self {
        assert!(frame_length > 0, "frame_length must be > 0");
        assert!(channel_count > 0, "channel_count must be > 0");
        Self {
            frame_length,
            channel_count,
            pending: Vec::with_capacity(frame_length * channel_count),
        }
    }

    /// Append interleaved samples and return every frame that is now
    /// complete, oldest first.
    pub fn push_interleaved(&mut self, samples: &[f32]) -> Vec<FrameSet> {
        self.pending.extend_from_slice(samples);

        let block = self.frame_length * self.channel_count;
        let complete = self.pending.len() / block;
        if complete == 0 {
            return Vec::new();
        }

        let rest = self.pending.split_off(complete * block);
        let ready = std::mem::replace(&mut self.pending, rest);

        ready
            .chunks_exact(block)
            .filter_map(|chunk| FrameSet::from_interleaved(chunk, self.channel_count))
            .collect()
    }

    /// Interleaved samples waiting for a full frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_set_rejects_ragged_channels() {
        assert!(FrameSet::new(vec![vec![0.0; 4], vec![0.0; 3]]).is_none());
        assert!(FrameSet::new(Vec::new()).is_none());
    }

    #[test]
    fn from_interleaved_splits_channels() {
        let frame = FrameSet::from_interleaved(&[0.1, -0.1, 0.2, -0.2], 2).unwrap();
        assert_eq!(frame.channel_count(), 2);
        assert_eq!(frame.channel(0), Some(&[0.1, 0.2][..]));
        assert_eq!(frame.channel(1), Some(&[-0.1, -0.2][..]));
    }

    #[test]
    fn normalize_amplitude_scale() {
        assert_eq!(normalize_amplitude(128), 0.0);
        assert_eq!(normalize_amplitude(0), -1.0);
        assert!((normalize_amplitude(255) - 0.9921875).abs() < 1e-7);
    }

    #[test]
    fn amplitude_byte_tracks_sample_level() {
        assert_eq!(sample_to_amplitude_byte(0.0), 128);
        assert_eq!(sample_to_amplitude_byte(-1.0), 0);
        assert_eq!(sample_to_amplitude_byte(1.0), 255);
    }

    #[test]
    fn amplitude_byte_reads_start_of_trailing_window() {
        let mut samples = vec![0.0_f32; 8];
        samples[4] = 0.5;
        let frame = FrameSet::new(vec![samples]).unwrap();
        // Window of 4 → index 8 - 4 = 4.
        assert_eq!(amplitude_byte(&frame, 4), sample_to_amplitude_byte(0.5));
        // Window larger than the frame → index 0.
        assert_eq!(amplitude_byte(&frame, 2048), 128);
    }

    #[test]
    fn assembler_emits_complete_frames_only() {
        let mut asm = FrameAssembler::new(2, 2);
        assert!(asm.push_interleaved(&[0.1, 0.2, 0.3]).is_empty());
        assert_eq!(asm.pending_len(), 3);

        let frames = asm.push_interleaved(&[0.4, 0.5, 0.6, 0.7, 0.8, 0.9]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].channel(0), Some(&[0.1, 0.3][..]));
        assert_eq!(frames[0].channel(1), Some(&[0.2, 0.4][..]));
        assert_eq!(frames[1].channel(0), Some(&[0.5, 0.7][..]));
        assert_eq!(asm.pending_len(), 1);
    }

    #[test]
    #[should_panic(expected = "frame_length must be > 0")]
    fn zero_frame_length_panics() {
        FrameAssembler::new(0, 1);
    }
}
