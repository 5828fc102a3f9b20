use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use call_recorder_core::{
    AudioDeviceRegistry, CallSessionRecorder, DeviceError, FrameCallback, PlaybackEngine, PlaybackOutcome,
    RecorderConfiguration, RecorderDelegate, RecordingLibrary, RecordingResult,
};
use call_recorder_cpal::cli::{init_logging, Cli, Command};
use call_recorder_cpal::{CpalMicPump, CpalOutputBackend};
use clap::Parser;

/// Reports capture lifecycle events to the log.
struct LogDelegate;

impl RecorderDelegate for LogDelegate {
    fn on_capture_started(&self, file_path: &Path) {
        log::info!("Recording to {}", file_path.display());
    }

    fn on_error(&self, error: &DeviceError) {
        log::error!("Recording error: {}", error);
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        log::info!(
            "Recording finished: {} bytes, {:.2}s, {} frame(s) dropped",
            result.bytes_written,
            result.duration_secs,
            result.frames_dropped
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = cli.load_config().context("failed to load configuration")?;
    log::debug!("Using recordings directory {}", config.recordings_dir.display());

    match &cli.command {
        Command::List => list(&config),
        Command::Devices => devices(),
        Command::Play { file, device } => play(&config, file, device.as_deref()),
        Command::Record { session, seconds } => record(&config, session, Duration::from_secs(*seconds)),
    }
}

fn list(config: &RecorderConfiguration) -> Result<()> {
    let library = RecordingLibrary::new(&config.recordings_dir);
    let recordings = library.list()?;
    if recordings.is_empty() {
        println!("No recordings in {}", library.dir().display());
        return Ok(());
    }

    for info in recordings {
        let started = info.started_at.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        let session = info.session_id.as_deref().unwrap_or("-");
        println!(
            "{:<40} {:>12} {:>10} {:>8.1}s  {}",
            info.file_name,
            started,
            info.size_bytes,
            config.format.duration_secs(info.size_bytes),
            session
        );
    }
    Ok(())
}

fn devices() -> Result<()> {
    for name in CpalOutputBackend::list_devices()? {
        println!("{}", name);
    }
    Ok(())
}

fn play(config: &RecorderConfiguration, file: &Path, device: Option<&str>) -> Result<()> {
    let path = resolve_recording(config, file)?;
    let backend = match device {
        Some(name) => CpalOutputBackend::named(name),
        None => CpalOutputBackend::default_device(),
    };
    let engine = PlaybackEngine::new(Arc::new(backend), config)?;

    let handle = engine.play(&path)?;
    log::info!("Playing {} ({})", path.display(), handle.token());
    let report = handle.join()?;

    match report.outcome {
        PlaybackOutcome::Completed => {
            println!("Played {} bytes in {} chunk(s)", report.bytes_written, report.chunks_written);
            Ok(())
        }
        PlaybackOutcome::Superseded => Ok(()),
        PlaybackOutcome::Failed(e) => Err(e.into()),
    }
}

/// Bare file names are looked up in the recordings directory; anything
/// with a directory component is used as given.
fn resolve_recording(config: &RecorderConfiguration, file: &Path) -> Result<PathBuf> {
    if file.components().count() > 1 {
        return Ok(file.to_path_buf());
    }
    let name = file.to_str().context("file name is not valid UTF-8")?;
    match RecordingLibrary::new(&config.recordings_dir).resolve(name) {
        Some(path) => Ok(path),
        None => bail!("not a recording name: {}", name),
    }
}

fn record(config: &RecorderConfiguration, session: &str, duration: Duration) -> Result<()> {
    let mut recorder = CallSessionRecorder::new(config, AudioDeviceRegistry::with_placeholder())?;
    recorder.set_delegate(Arc::new(LogDelegate));

    let device = recorder.on_session_connecting(session);
    if let Err(e) = device.capturer().start_capture() {
        // The session stays usable without a recording; tear it down since
        // there is nothing left for this command to do.
        recorder.on_session_disconnected();
        return Err(e).context(format!("session {} cannot be recorded", session));
    }

    let sink: FrameCallback = {
        let device = Arc::clone(&device);
        Arc::new(move |frame: &[u8]| device.capturer().deliver_frame(frame))
    };
    let pump = match CpalMicPump::start(config.format, sink) {
        Ok(pump) => pump,
        Err(e) => {
            recorder.on_session_disconnected();
            return Err(e.into());
        }
    };

    log::info!("Recording session {} for {}s", session, duration.as_secs());
    std::thread::sleep(duration);
    pump.stop()?;

    match recorder.on_session_disconnected() {
        Some(result) => {
            println!("{} ({} bytes, sha256 {})", result.file_path.display(), result.bytes_written, result.checksum);
            Ok(())
        }
        None => bail!("session {} produced no recording", session),
    }
}
