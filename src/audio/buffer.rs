//! Growable per-channel sample store.
//!
//! [`SampleBuffer`] keeps every accepted frame as its own chunk and only
//! copies samples into one contiguous array per channel when asked to
//! [`merge`](SampleBuffer::merge).  Appending is therefore a move, never a
//! copy, which keeps the ingest path cheap.
//!
//! # Example
//!
//! ```rust
//! use speech_recorder::audio::{FrameSet, SampleBuffer};
//!
//! let mut buf = SampleBuffer::new(1);
//! buf.push(FrameSet::new(vec![vec![1.0, 2.0]]).unwrap());
//! buf.push(FrameSet::new(vec![vec![3.0]]).unwrap());
//! assert_eq!(buf.merge(), vec![vec![1.0, 2.0, 3.0]]);
//! ```

use super::frame::FrameSet;

/// Per-channel merged sample arrays, channel 0 first.
pub type ChannelBuffers = Vec<Vec<f32>>;

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Accumulates [`FrameSet`]s channel by channel.
///
/// All channels always hold the same number of samples: a frame is only
/// accepted when its channel count matches the buffer's.
pub struct SampleBuffer {
    chunks: Vec<Vec<Vec<f32>>>,
    /// Samples per channel accumulated so far.
    len: usize,
}

impl SampleBuffer {
    /// Create an empty buffer for `channel_count` channels.
    ///
    /// # Panics
    ///
    /// Panics if `channel_count == 0`.
    pub fn new(channel_count: usize) -> Self {
        assert!(channel_count > 0, "SampleBuffer channel_count must be > 0");
        Self {
            chunks: vec![Vec::new(); channel_count],
            len: 0,
        }
    }

    /// Append one frame.
    ///
    /// Returns `false` (and stores nothing) when the frame's channel count
    /// does not match the buffer.
    pub fn push(&mut self, frame: FrameSet) -> bool {
        if frame.channel_count() != self.chunks.len() {
            return false;
        }
        let frame_len = frame.len();
        for (store, samples) in self.chunks.iter_mut().zip(frame.into_channels()) {
            store.push(samples);
        }
        self.len += frame_len;
        true
    }

    /// Concatenate each channel's chunks into one array.
    ///
    /// Does not modify the buffer.
    pub fn merge(&self) -> ChannelBuffers {
        self.chunks
            .iter()
            .map(|chunks| {
                let mut merged = Vec::with_capacity(self.len);
                for chunk in chunks {
                    merged.extend_from_slice(chunk);
                }
                merged
            })
            .collect()
    }

    /// Discard all samples.
    pub fn clear(&mut self) {
        for store in &mut self.chunks {
            store.clear();
        }
        self.len = 0;
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn channel_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of frames pushed since the last clear.
    pub fn frame_count(&self) -> usize {
        self.chunks[0].len()
    }

    /// Buffered duration in seconds at `sample_rate` Hz.
    pub fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.len as f32 / sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(left: &[f32], right: &[f32]) -> FrameSet {
        FrameSet::new(vec![left.to_vec(), right.to_vec()]).unwrap()
    }

    #[test]
    fn merge_concatenates_in_push_order() {
        let mut buf = SampleBuffer::new(2);
        buf.push(stereo(&[1.0, 2.0], &[-1.0, -2.0]));
        buf.push(stereo(&[3.0], &[-3.0]));

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.frame_count(), 2);
        assert_eq!(
            buf.merge(),
            vec![vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]]
        );
    }

    #[test]
    fn merge_does_not_consume() {
        let mut buf = SampleBuffer::new(1);
        buf.push(FrameSet::new(vec![vec![0.5; 4]]).unwrap());
        let first = buf.merge();
        let second = buf.merge();
        assert_eq!(first, second);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn empty_buffer_merges_to_empty_channels() {
        let buf = SampleBuffer::new(2);
        assert!(buf.is_empty());
        assert_eq!(buf.merge(), vec![Vec::<f32>::new(), Vec::new()]);
    }

    #[test]
    fn mismatched_channel_count_is_rejected() {
        let mut buf = SampleBuffer::new(2);
        assert!(!buf.push(FrameSet::new(vec![vec![1.0]]).unwrap()));
        assert!(buf.is_empty());
    }

    #[test]
    fn clear_resets_and_buffer_is_reusable() {
        let mut buf = SampleBuffer::new(1);
        buf.push(FrameSet::new(vec![vec![1.0, 2.0]]).unwrap());
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.frame_count(), 0);

        buf.push(FrameSet::new(vec![vec![9.0]]).unwrap());
        assert_eq!(buf.merge(), vec![vec![9.0]]);
    }

    #[test]
    fn duration_secs_calculation() {
        let mut buf = SampleBuffer::new(1);
        buf.push(FrameSet::silent(1, 8_000));
        assert!((buf.duration_secs(16_000) - 0.5).abs() < 1e-6);
        assert_eq!(buf.duration_secs(0), 0.0);
    }

    #[test]
    #[should_panic(expected = "SampleBuffer channel_count must be > 0")]
    fn zero_channels_panics() {
        let _ = SampleBuffer::new(0);
    }
}
