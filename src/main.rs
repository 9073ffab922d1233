//! Application entry point for the speech recorder CLI.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line and load [`AppConfig`] (default on first run).
//! 3. Open the cpal input device.
//! 4. Spawn the [`RecordingSession`] on the tokio runtime.
//! 5. Start the capture stream and a thread that feeds frames to the session.
//! 6. Record until Ctrl-C, the time limit, or (with `--stop-on-silence`) the
//!    first silence after speech.
//! 7. Export the WAV and write it to disk.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use speech_recorder::{
    audio::{AudioCapture, CapturedFrame},
    config::{AppConfig, OutputConfig},
    session::RecordingSession,
};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "speech-recorder", version, about = "Record speech from the microphone to a WAV file")]
struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output WAV path (defaults to a timestamped file in the recordings directory).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many seconds.
    #[arg(short, long)]
    seconds: Option<u64>,

    /// Stop at the first silence after speech has been heard.
    #[arg(long)]
    stop_on_silence: bool,

    /// Export sample rate in Hz.
    #[arg(long)]
    downsample: Option<u32>,

    /// Record a single channel.
    #[arg(long)]
    mono: bool,

    /// Input device name.
    #[arg(long)]
    device: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(rate) = self.downsample {
            config.recorder.downsample_to = Some(rate);
        }
        if self.mono {
            config.recorder.channel_count = 1;
        }
        if let Some(device) = &self.device {
            config.capture.device = Some(device.clone());
        }
    }
}

fn default_output_path(output: &OutputConfig) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    output.recording_path(stamp)
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Configuration
    let cli = Cli::parse();
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    cli.apply(&mut config);

    // 3. Input device
    let capture = AudioCapture::new(config.capture.device.as_deref())
        .context("audio capture unavailable")?;
    log::info!(
        "Input device: {} Hz, {} ch",
        capture.sample_rate(),
        capture.channels()
    );

    // 4. Session
    let session = Arc::new(RecordingSession::spawn(
        config.recorder.clone(),
        capture.sample_rate(),
    )?);

    let finished = Arc::new(Notify::new());
    if cli.stop_on_silence {
        let heard_speech = Arc::new(AtomicBool::new(false));

        let heard = Arc::clone(&heard_speech);
        session.on_exit_silence(move || {
            log::info!("Speech detected");
            heard.store(true, Ordering::Release);
        });

        let done = Arc::clone(&finished);
        session.on_silence(move || {
            if heard_speech.load(Ordering::Acquire) {
                log::info!("Silence detected, finishing");
                done.notify_one();
            }
        });
    }

    // 5. Capture stream + feeder thread
    let (frame_tx, frame_rx) = mpsc::channel::<CapturedFrame>();
    let _stream = capture
        .start(
            config.recorder.channel_count as usize,
            config.recorder.frame_length,
            config.capture.analysis_window,
            frame_tx,
        )
        .context("failed to start audio stream")?;

    let feeder = Arc::clone(&session);
    std::thread::Builder::new()
        .name("frame-feed".into())
        .spawn(move || {
            while let Ok(captured) = frame_rx.recv() {
                if let Err(e) = feeder.process_frame(captured.frame, captured.amplitude_byte) {
                    log::warn!("Dropped frame: {e}");
                }
            }
        })
        .context("failed to spawn frame-feed thread")?;

    // 6. Record
    session.record();
    log::info!("{}, press Ctrl-C to stop", session.state().label());

    let time_limit = async {
        match cli.seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => res.context("failed to listen for Ctrl-C")?,
        _ = finished.notified() => {}
        _ = time_limit => log::info!("Time limit reached"),
    }
    session.stop();
    log::info!("Session {}", session.state().label().to_lowercase());

    // 7. Export
    let wav = session.export_wav(None).await?;
    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config.output));
    wav.write_to(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    let desc = wav.descriptor()?;
    let secs = desc.data_len as f32 / desc.byte_rate().max(1) as f32;
    log::info!(
        "Wrote {} ({:.2}s, {} Hz, {} ch)",
        path.display(),
        secs,
        desc.sample_rate,
        desc.channel_count
    );

    Ok(())
}
