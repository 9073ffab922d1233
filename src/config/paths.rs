//! Platform directories for settings and exported recordings.
//!
//! ```text
//! <config_dir>/speech-recorder/settings.toml
//! <data_local_dir>/speech-recorder/recordings/<prefix>-<unix secs>.wav
//! ```
//!
//! Either root falls back to `.` when `dirs` cannot resolve it.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "speech-recorder";
const SETTINGS_FILE: &str = "settings.toml";
const RECORDINGS_DIR: &str = "recordings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    /// `config_dir/settings.toml`.
    pub settings_file: PathBuf,
    /// Default target for exported WAV files.
    pub recordings_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let config_root = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        let data_root = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::rooted(&config_root, &data_root)
    }

    /// Lay the application directories out under explicit roots.
    pub fn rooted(config_root: &Path, data_root: &Path) -> Self {
        let config_dir = config_root.join(APP_DIR);
        Self {
            settings_file: config_dir.join(SETTINGS_FILE),
            recordings_dir: data_root.join(APP_DIR).join(RECORDINGS_DIR),
            config_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// `<dir>/<prefix>-<unix_secs>.wav`
pub fn recording_file(dir: &Path, prefix: &str, unix_secs: u64) -> PathBuf {
    dir.join(format!("{prefix}-{unix_secs}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_layout() {
        let paths = AppPaths::rooted(Path::new("/cfg"), Path::new("/data"));
        assert_eq!(paths.config_dir, Path::new("/cfg/speech-recorder"));
        assert_eq!(
            paths.settings_file,
            Path::new("/cfg/speech-recorder/settings.toml")
        );
        assert_eq!(
            paths.recordings_dir,
            Path::new("/data/speech-recorder/recordings")
        );
    }

    #[test]
    fn platform_paths_end_in_app_dirs() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.ends_with(APP_DIR));
        assert!(paths.recordings_dir.ends_with("speech-recorder/recordings"));
    }

    #[test]
    fn recording_file_name() {
        let path = recording_file(Path::new("out"), "take", 1_700_000_000);
        assert_eq!(path, Path::new("out/take-1700000000.wav"));
    }
}
