//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Keys missing from `settings.toml` fall back to their defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{recording_file, AppPaths};
use crate::audio::{DEFAULT_SILENCE_DURATION, DEFAULT_SILENCE_THRESHOLD};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A recorder configuration that cannot be used.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("frame_length must be greater than zero")]
    ZeroFrameLength,

    #[error("channel_count must be greater than zero")]
    ZeroChannels,

    #[error("unsupported channel layout: {0} channels (mono or stereo only)")]
    UnsupportedChannelLayout(u16),

    #[error("silence_duration_ms must be greater than zero")]
    ZeroSilenceDuration,

    #[error("silence_threshold must be a finite, non-negative amplitude (got {0})")]
    InvalidSilenceThreshold(f32),

    #[error("sample rate must be greater than zero")]
    ZeroSampleRate,

    #[error("cannot downsample {sample_rate} Hz to {target} Hz")]
    InvalidDownsample { target: u32, sample_rate: u32 },
}

// ---------------------------------------------------------------------------
// RecorderConfig
// ---------------------------------------------------------------------------

/// Settings for the recording session: framing, silence detection and
/// export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Samples per channel in each frame.
    pub frame_length: usize,
    /// Number of channels recorded and exported (1 or 2).
    pub channel_count: u16,
    /// MIME type attached to exported WAV blobs when none is requested.
    pub mime_type: String,
    /// Export sample rate in Hz; `None` keeps the device rate.
    pub downsample_to: Option<u32>,
    /// Quiet time before the session reports silence.
    pub silence_duration_ms: u64,
    /// Amplitude magnitude (on a `[-1, 1]` scale) above which a frame is
    /// loud.
    pub silence_threshold: f32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            frame_length: 4096,
            channel_count: 2,
            mime_type: "audio/wav".into(),
            downsample_to: None,
            silence_duration_ms: DEFAULT_SILENCE_DURATION.as_millis() as u64,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
        }
    }
}

impl RecorderConfig {
    pub fn silence_duration(&self) -> Duration {
        Duration::from_millis(self.silence_duration_ms)
    }

    /// Check the configuration against the device `sample_rate`.
    pub fn validate(&self, sample_rate: u32) -> Result<(), ConfigError> {
        if self.frame_length == 0 {
            return Err(ConfigError::ZeroFrameLength);
        }
        match self.channel_count {
            0 => return Err(ConfigError::ZeroChannels),
            1 | 2 => {}
            n => return Err(ConfigError::UnsupportedChannelLayout(n)),
        }
        if self.silence_duration_ms == 0 {
            return Err(ConfigError::ZeroSilenceDuration);
        }
        if !self.silence_threshold.is_finite() || self.silence_threshold < 0.0 {
            return Err(ConfigError::InvalidSilenceThreshold(self.silence_threshold));
        }
        if sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if let Some(target) = self.downsample_to {
            if target == 0 || target > sample_rate {
                return Err(ConfigError::InvalidDownsample {
                    target,
                    sample_rate,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for the microphone adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Input device name; `None` means the system default.
    pub device: Option<String>,
    /// Size of the time-domain window the amplitude byte is read from.
    pub analysis_window: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            analysis_window: 2048,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Where exported recordings are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Target directory; `None` means [`AppPaths::recordings_dir`].
    pub directory: Option<PathBuf>,
    /// File name prefix; a timestamp and `.wav` are appended.
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "recording".into(),
        }
    }
}

impl OutputConfig {
    /// Directory recordings go to, resolved against the platform paths.
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| AppPaths::new().recordings_dir)
    }

    /// Timestamped WAV path inside [`resolved_directory`](Self::resolved_directory).
    pub fn recording_path(&self, unix_secs: u64) -> PathBuf {
        recording_file(&self.resolved_directory(), &self.file_prefix, unix_secs)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use speech_recorder::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Recording session settings.
    pub recorder: RecorderConfig,
    /// Microphone adapter settings.
    pub capture: CaptureConfig,
    /// Export destination settings.
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.recorder.frame_length, 4096);
        assert_eq!(cfg.recorder.channel_count, 2);
        assert_eq!(cfg.recorder.mime_type, "audio/wav");
        assert_eq!(cfg.recorder.downsample_to, None);
        assert_eq!(cfg.recorder.silence_duration_ms, 1500);
        assert!((cfg.recorder.silence_threshold - 0.07).abs() < 1e-7);
        assert_eq!(cfg.capture.device, None);
        assert_eq!(cfg.capture.analysis_window, 2048);
        assert_eq!(cfg.output.file_prefix, "recording");
    }

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(original, loaded);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.recorder.channel_count = 1;
        cfg.recorder.downsample_to = Some(16_000);
        cfg.recorder.silence_duration_ms = 700;
        cfg.capture.device = Some("USB Mic".into());
        cfg.output.directory = Some(PathBuf::from("/tmp/recordings"));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[recorder]\nchannel_count = 1\n").unwrap();

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.recorder.channel_count, 1);
        assert_eq!(config.recorder.frame_length, 4096);
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert_eq!(RecorderConfig::default().validate(44_100), Ok(()));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = RecorderConfig::default();

        let cfg = RecorderConfig { frame_length: 0, ..base.clone() };
        assert_eq!(cfg.validate(44_100), Err(ConfigError::ZeroFrameLength));

        let cfg = RecorderConfig { channel_count: 0, ..base.clone() };
        assert_eq!(cfg.validate(44_100), Err(ConfigError::ZeroChannels));

        let cfg = RecorderConfig { channel_count: 6, ..base.clone() };
        assert_eq!(
            cfg.validate(44_100),
            Err(ConfigError::UnsupportedChannelLayout(6))
        );

        let cfg = RecorderConfig { silence_duration_ms: 0, ..base.clone() };
        assert_eq!(cfg.validate(44_100), Err(ConfigError::ZeroSilenceDuration));

        let cfg = RecorderConfig { downsample_to: Some(96_000), ..base.clone() };
        assert_eq!(
            cfg.validate(44_100),
            Err(ConfigError::InvalidDownsample {
                target: 96_000,
                sample_rate: 44_100
            })
        );

        assert_eq!(base.validate(0), Err(ConfigError::ZeroSampleRate));
    }

    #[test]
    fn validate_rejects_unusable_thresholds() {
        for threshold in [-0.1, f32::INFINITY] {
            let cfg = RecorderConfig { silence_threshold: threshold, ..Default::default() };
            assert_eq!(
                cfg.validate(44_100),
                Err(ConfigError::InvalidSilenceThreshold(threshold))
            );
        }

        // NaN never compares equal, so match on the variant.
        let cfg = RecorderConfig { silence_threshold: f32::NAN, ..Default::default() };
        assert!(matches!(
            cfg.validate(44_100),
            Err(ConfigError::InvalidSilenceThreshold(t)) if t.is_nan()
        ));

        let cfg = RecorderConfig { silence_threshold: 0.0, ..Default::default() };
        assert_eq!(cfg.validate(44_100), Ok(()));
    }

    #[test]
    fn silence_duration_conversion() {
        let cfg = RecorderConfig { silence_duration_ms: 700, ..Default::default() };
        assert_eq!(cfg.silence_duration(), Duration::from_millis(700));
    }

    #[test]
    fn recording_path_uses_configured_directory() {
        let output = OutputConfig {
            directory: Some(PathBuf::from("takes")),
            file_prefix: "memo".into(),
        };
        assert_eq!(output.recording_path(42), PathBuf::from("takes/memo-42.wav"));
    }
}
