//! Configuration module for the speech recorder.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the recorder,
//! capture adapter and output, `AppPaths` for cross-platform directories,
//! and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::{recording_file, AppPaths};
pub use settings::{AppConfig, CaptureConfig, ConfigError, OutputConfig, RecorderConfig};
