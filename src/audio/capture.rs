//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  Call
//! [`AudioCapture::start`] to begin streaming [`CapturedFrame`]s over an
//! mpsc channel.  The returned [`StreamHandle`] is a RAII guard; dropping
//! it stops the underlying cpal stream.
//!
//! Only an input stream is opened; nothing is routed to an output device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

use super::frame::{amplitude_byte, FrameAssembler, FrameSet};

// ---------------------------------------------------------------------------
// CapturedFrame
// ---------------------------------------------------------------------------

/// One fixed-length frame plus its amplitude byte, as delivered to the
/// recording session.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame: FrameSet,
    /// Time-domain sample on the unsigned byte scale (128 = zero line).
    pub amplitude_byte: u8,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running the audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device `{0}` not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// Channel fitting
// ---------------------------------------------------------------------------

/// Adapt a device frame to the session's channel count.
///
/// Extra device channels are dropped; missing ones are filled with a copy
/// of the first channel.
pub fn fit_channels(frame: FrameSet, channel_count: usize) -> FrameSet {
    if frame.channel_count() == channel_count {
        return frame;
    }
    let mut channels = frame.into_channels();
    channels.truncate(channel_count.max(1));
    while channels.len() < channel_count {
        let first = channels[0].clone();
        channels.push(first);
    }
    FrameSet::new(channels).unwrap_or_else(|| FrameSet::silent(channel_count, 0))
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture device wrapper built on top of `cpal`.
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
}

impl AudioCapture {
    /// Open the input device called `device_name`, or the system default
    /// when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] / [`CaptureError::DeviceNotFound`]
    /// when no matching input device is available, or
    /// [`CaptureError::DefaultConfig`] when the device cannot report a
    /// default stream configuration.
    pub fn new(device_name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string()))?,
            None => host
                .default_input_device()
                .ok_or(CaptureError::NoDevice)?,
        };

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start capturing and send one [`CapturedFrame`] per `frame_length`
    /// samples per channel to `tx`.
    ///
    /// Frames are fitted to `channel_count` channels with [`fit_channels`].
    /// `analysis_window` sets where the amplitude byte is taken (see
    /// [`amplitude_byte`]).  Send errors are ignored so the audio thread
    /// never panics.
    pub fn start(
        &self,
        channel_count: usize,
        frame_length: usize,
        analysis_window: usize,
        tx: mpsc::Sender<CapturedFrame>,
    ) -> Result<StreamHandle, CaptureError> {
        let mut assembler = FrameAssembler::new(frame_length, self.channels as usize);

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for frame in assembler.push_interleaved(data) {
                    let frame = fit_channels(frame, channel_count);
                    let captured = CapturedFrame {
                        amplitude_byte: amplitude_byte(&frame, analysis_window),
                        frame,
                    };
                    let _ = tx.send(captured);
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels the device delivers.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_frame_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CapturedFrame>();
    }

    #[test]
    fn fit_channels_duplicates_mono() {
        let mono = FrameSet::new(vec![vec![0.1, 0.2]]).unwrap();
        let stereo = fit_channels(mono, 2);
        assert_eq!(stereo.channel_count(), 2);
        assert_eq!(stereo.channel(1), Some(&[0.1, 0.2][..]));
    }

    #[test]
    fn fit_channels_drops_extra() {
        let quad = FrameSet::new(vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]]).unwrap();
        let stereo = fit_channels(quad, 2);
        assert_eq!(stereo.into_channels(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn fit_channels_same_count_is_untouched() {
        let frame = FrameSet::new(vec![vec![0.5], vec![-0.5]]).unwrap();
        assert_eq!(fit_channels(frame.clone(), 2), frame);
    }
}
