//! Block-average downsampling.
//!
//! [`downsample`] reduces the sample rate by averaging each block of input
//! samples that maps onto one output sample.  There is no anti-alias filter:
//! the output is meant for speech capture where size matters more than
//! fidelity.

// ---------------------------------------------------------------------------
// downsample
// ---------------------------------------------------------------------------

/// Downsample mono `samples` from `source_rate` to `target_rate` Hz.
///
/// With `ratio = source_rate / target_rate`, output sample `i` is the mean
/// of the inputs whose index lies in `[round(i * ratio), round((i + 1) *
/// ratio))`.  The output length is `round(samples.len() / ratio)`.
///
/// * If the rates are equal the input is returned unchanged.
/// * If `target_rate` is zero or above `source_rate` the input is returned
///   unchanged; block averaging cannot upsample.
///
/// # Example
///
/// ```rust
/// use speech_recorder::wav::downsample;
///
/// let out = downsample(&[1.0, 1.0, 0.0, 0.0], 4, 2);
/// assert_eq!(out, vec![1.0, 0.0]);
/// ```
pub fn downsample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if target_rate == 0 || target_rate >= source_rate {
        return samples.to_vec();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let output_len = (samples.len() as f64 / ratio).round() as usize;
    let mut output = Vec::with_capacity(output_len);

    let mut start = 0usize;
    for i in 0..output_len {
        let end = (((i + 1) as f64 * ratio).round() as usize).min(samples.len());
        let block = &samples[start.min(end)..end];

        let value = if block.is_empty() {
            0.0
        } else {
            let sum: f64 = block.iter().map(|&s| s as f64).sum();
            (sum / block.len() as f64) as f32
        };
        output.push(value);
        start = end;
    }

    output
}

/// Downsample each channel independently.
pub fn downsample_channels(channels: &[Vec<f32>], source_rate: u32, target_rate: u32) -> Vec<Vec<f32>> {
    channels
        .iter()
        .map(|ch| downsample(ch, source_rate, target_rate))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halving_averages_pairs() {
        assert_eq!(downsample(&[1.0, 1.0, 0.0, 0.0], 4, 2), vec![1.0, 0.0]);
        assert_eq!(downsample(&[1.0, 0.0, 0.5, 0.5], 4, 2), vec![0.5, 0.5]);
    }

    #[test]
    fn same_rate_is_noop() {
        let input = vec![0.1_f32, -0.2, 0.3];
        assert_eq!(downsample(&input, 16_000, 16_000), input);
    }

    #[test]
    fn upsampling_is_refused() {
        let input = vec![0.1_f32, 0.2];
        assert_eq!(downsample(&input, 8_000, 16_000), input);
    }

    #[test]
    fn empty_input() {
        assert!(downsample(&[], 48_000, 16_000).is_empty());
    }

    #[test]
    fn output_length_rounds() {
        // 44.1 kHz → 16 kHz, one second of audio.
        let out = downsample(&vec![0.0_f32; 44_100], 44_100, 16_000);
        assert_eq!(out.len(), 16_000);

        // 5 samples, ratio 2 → round(2.5) = 3 outputs; last block is short.
        let out = downsample(&[1.0, 1.0, 1.0, 1.0, 0.5], 2, 1);
        assert_eq!(out, vec![1.0, 1.0, 0.5]);
    }

    #[test]
    fn fractional_ratio_uses_rounded_block_edges() {
        // ratio = 1.5: blocks [0,2) [2,3) [3,5) [5,6)
        let input = [0.0_f32, 1.0, 2.0, 3.0, 4.0, 5.0];
        let out = downsample(&input, 3, 2);
        assert_eq!(out, vec![0.5, 2.0, 3.5, 5.0]);
    }

    #[test]
    fn constant_signal_preserves_amplitude() {
        let out = downsample(&vec![0.25_f32; 480], 48_000, 16_000);
        assert_eq!(out.len(), 160);
        assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn channels_are_downsampled_independently() {
        let out = downsample_channels(&[vec![1.0, 1.0], vec![-1.0, -1.0]], 2, 1);
        assert_eq!(out, vec![vec![1.0], vec![-1.0]]);
    }
}
