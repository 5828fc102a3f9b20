use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::DeviceError;
use crate::models::format::PcmFormat;
use crate::models::recording::{RecordingMetadata, RecordingResult};
use crate::models::state::{CaptureDiagnostics, CaptureState};
use crate::models::token::CaptureSessionToken;
use crate::storage::raw_writer::RawFileWriter;
use crate::traits::capturer::{Capturer, FrameCallback};
use crate::traits::recorder_delegate::RecorderDelegate;

/// Mutable adapter state, protected by `parking_lot::Mutex`.
struct AdapterState {
    state: CaptureState,
    writer: RawFileWriter,
    diagnostics: CaptureDiagnostics,
}

/// Capture half of the recording device: appends every delivered frame to
/// the session's recording file.
///
/// Data flow:
/// ```text
/// [call engine audio thread] → deliver_frame → [BufWriter] → <epoch>-<session>.raw
/// ```
///
/// One adapter serves exactly one capture run. After `stop_capture` it
/// rejects further starts; the next call gets a fresh adapter.
pub struct CaptureAdapter {
    token: CaptureSessionToken,
    format: PcmFormat,
    file_path: PathBuf,
    inner: Mutex<AdapterState>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

impl CaptureAdapter {
    pub fn new(token: CaptureSessionToken, file_path: PathBuf, format: PcmFormat) -> Self {
        Self {
            token,
            format,
            inner: Mutex::new(AdapterState {
                state: CaptureState::Idle,
                writer: RawFileWriter::new(file_path.clone()),
                diagnostics: CaptureDiagnostics::default(),
            }),
            file_path,
            delegate: None,
        }
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn RecorderDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn token(&self) -> &CaptureSessionToken {
        &self.token
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn state(&self) -> CaptureState {
        self.inner.lock().state
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.inner.lock().diagnostics.clone()
    }

    pub fn bytes_written(&self) -> u64 {
        self.inner.lock().diagnostics.bytes_written
    }

    /// Callback form of `deliver_frame` for audio pipelines that take a
    /// closure instead of a device object.
    pub fn frame_sink(self: &Arc<Self>) -> FrameCallback {
        let adapter = Arc::clone(self);
        Arc::new(move |frame: &[u8]| adapter.deliver_frame(frame))
    }

    fn report_error(&self, error: &DeviceError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}

impl Capturer for CaptureAdapter {
    fn start_capture(&self) -> Result<(), DeviceError> {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                CaptureState::Idle => {}
                CaptureState::Capturing | CaptureState::Dropping => {
                    return Err(DeviceError::InvalidState("capture already running".into()));
                }
                CaptureState::Stopped => {
                    return Err(DeviceError::InvalidState(
                        "adapter already stopped; a new call needs a new adapter".into(),
                    ));
                }
            }

            if let Err(e) = inner.writer.open() {
                drop(inner);
                log::error!("Recording for {} disabled: {}", self.token, e);
                self.report_error(&e);
                return Err(e);
            }
            inner.state = CaptureState::Capturing;
        }

        log::info!("Capture started: {}", self.file_path.display());
        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_started(&self.file_path);
        }
        Ok(())
    }

    fn stop_capture(&self) -> Result<RecordingResult, DeviceError> {
        // Detach the writer under the lock and finalize it outside, so frames
        // arriving meanwhile are dropped instead of waiting on the sync.
        let (mut writer, write_failed, diagnostics) = {
            let mut inner = self.inner.lock();
            let write_failed = match inner.state {
                CaptureState::Capturing => false,
                CaptureState::Dropping => true,
                CaptureState::Idle => {
                    return Err(DeviceError::InvalidState("capture was never started".into()));
                }
                CaptureState::Stopped => {
                    return Err(DeviceError::InvalidState("capture already stopped".into()));
                }
            };
            inner.state = CaptureState::Stopped;
            let writer = std::mem::replace(&mut inner.writer, RawFileWriter::new(self.file_path.clone()));
            (writer, write_failed, inner.diagnostics.clone())
        };

        let checksum = if write_failed {
            // The failure that put us in Dropping was already reported.
            log::warn!("Closing degraded recording {}", self.file_path.display());
            writer.abandon();
            String::new()
        } else {
            match writer.close() {
                Ok(checksum) => checksum,
                Err(e) => {
                    log::error!("Failed to finalize {}: {}", self.file_path.display(), e);
                    self.report_error(&e);
                    return Err(e);
                }
            }
        };
        let bytes_written = writer.bytes_written();

        let metadata = RecordingMetadata::new(
            &self.token,
            &self.file_path.to_string_lossy(),
            &self.format,
            bytes_written,
            &checksum,
            write_failed,
        );
        let result = RecordingResult {
            file_path: self.file_path.clone(),
            bytes_written,
            frames_delivered: diagnostics.frames_delivered,
            frames_dropped: diagnostics.frames_dropped,
            duration_secs: self.format.duration_secs(bytes_written),
            checksum,
            metadata,
        };

        log::info!(
            "Capture stopped: {} ({} bytes, {:.1}s, {} frames dropped)",
            self.file_path.display(),
            result.bytes_written,
            result.duration_secs,
            result.frames_dropped
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_finished(&result);
        }
        Ok(result)
    }

    fn deliver_frame(&self, frame: &[u8]) {
        let mut inner = self.inner.lock();
        inner.diagnostics.frames_delivered += 1;

        if inner.state != CaptureState::Capturing {
            inner.diagnostics.frames_dropped += 1;
            return;
        }

        match inner.writer.write(frame) {
            Ok(()) => {
                inner.diagnostics.frames_written += 1;
                inner.diagnostics.bytes_written += frame.len() as u64;
            }
            Err(e) => {
                // First failure ends persistence for this call; later frames
                // take the early return above.
                inner.state = CaptureState::Dropping;
                inner.diagnostics.frames_dropped += 1;
                drop(inner);
                log::error!(
                    "Recording write failed for {}, dropping remaining frames: {}",
                    self.token,
                    e
                );
                self.report_error(&e);
            }
        }
    }

    fn is_capturing(&self) -> bool {
        self.inner.lock().state.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[derive(Default)]
    struct RecordingDelegate {
        started: Mutex<Vec<PathBuf>>,
        errors: Mutex<Vec<DeviceError>>,
        finished: Mutex<Vec<RecordingResult>>,
    }

    impl RecorderDelegate for RecordingDelegate {
        fn on_capture_started(&self, file_path: &Path) {
            self.started.lock().push(file_path.to_path_buf());
        }

        fn on_error(&self, error: &DeviceError) {
            self.errors.lock().push(error.clone());
        }

        fn on_capture_finished(&self, result: &RecordingResult) {
            self.finished.lock().push(result.clone());
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("call_recorder_adapter_{}_{}", std::process::id(), name));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn adapter_in(dir: &Path) -> CaptureAdapter {
        let token = CaptureSessionToken::new(1000, "s1");
        let path = dir.join(token.file_name());
        CaptureAdapter::new(token, path, PcmFormat::RECORDING)
    }

    #[test]
    fn frames_appended_in_order() {
        let dir = temp_dir("order");
        let adapter = adapter_in(&dir);
        adapter.start_capture().unwrap();

        let frames: Vec<Vec<u8>> = (0..10u8).map(|i| vec![i; 37 + i as usize]).collect();
        for frame in &frames {
            adapter.deliver_frame(frame);
        }
        let result = adapter.stop_capture().unwrap();

        let expected: Vec<u8> = frames.concat();
        assert_eq!(result.bytes_written, expected.len() as u64);
        assert_eq!(fs::read(adapter.file_path()).unwrap(), expected);
        assert_eq!(result.frames_delivered, 10);
        assert_eq!(result.frames_dropped, 0);
        assert!(!result.metadata.write_failed);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn frames_outside_capture_are_dropped() {
        let dir = temp_dir("outside");
        let adapter = adapter_in(&dir);

        adapter.deliver_frame(&[1, 2]);
        adapter.start_capture().unwrap();
        adapter.deliver_frame(&[3, 4]);
        adapter.stop_capture().unwrap();
        adapter.deliver_frame(&[5, 6]);

        assert_eq!(fs::read(adapter.file_path()).unwrap(), vec![3, 4]);
        let diagnostics = adapter.diagnostics();
        assert_eq!(diagnostics.frames_delivered, 3);
        assert_eq!(diagnostics.frames_written, 1);
        assert_eq!(diagnostics.frames_dropped, 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stopped_adapter_cannot_restart() {
        let dir = temp_dir("restart");
        let adapter = adapter_in(&dir);
        adapter.start_capture().unwrap();
        adapter.stop_capture().unwrap();

        assert!(matches!(adapter.start_capture(), Err(DeviceError::InvalidState(_))));
        assert!(matches!(adapter.stop_capture(), Err(DeviceError::InvalidState(_))));
        assert_eq!(adapter.state(), CaptureState::Stopped);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn double_start_rejected() {
        let dir = temp_dir("double");
        let adapter = adapter_in(&dir);
        adapter.start_capture().unwrap();
        assert!(matches!(adapter.start_capture(), Err(DeviceError::InvalidState(_))));
        assert!(adapter.is_capturing());
        adapter.stop_capture().unwrap();

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stop_without_start_rejected() {
        let dir = temp_dir("nostart");
        let adapter = adapter_in(&dir);
        assert!(matches!(adapter.stop_capture(), Err(DeviceError::InvalidState(_))));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn open_failure_reported_once() {
        let dir = temp_dir("openfail");
        let token = CaptureSessionToken::new(1000, "s1");
        let path = dir.join("missing").join(token.file_name());
        let delegate = Arc::new(RecordingDelegate::default());
        let adapter = CaptureAdapter::new(token, path, PcmFormat::RECORDING)
            .with_delegate(delegate.clone());

        assert!(matches!(adapter.start_capture(), Err(DeviceError::OpenFailed(_))));
        assert!(!adapter.is_capturing());
        adapter.deliver_frame(&[0; 320]);

        assert_eq!(delegate.errors.lock().len(), 1);
        assert!(delegate.started.lock().is_empty());
        assert_eq!(adapter.diagnostics().frames_dropped, 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn delegate_sees_lifecycle() {
        let dir = temp_dir("delegate");
        let delegate = Arc::new(RecordingDelegate::default());
        let adapter = adapter_in(&dir).with_delegate(delegate.clone());

        adapter.start_capture().unwrap();
        adapter.deliver_frame(&[0; 320]);
        let result = adapter.stop_capture().unwrap();

        assert_eq!(delegate.started.lock().as_slice(), &[adapter.file_path().to_path_buf()]);
        assert!(delegate.errors.lock().is_empty());
        assert_eq!(delegate.finished.lock().as_slice(), &[result]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn frame_sink_delivers_to_adapter() {
        let dir = temp_dir("sink");
        let adapter = Arc::new(adapter_in(&dir));
        adapter.start_capture().unwrap();

        let sink = adapter.frame_sink();
        let worker = {
            let sink = Arc::clone(&sink);
            std::thread::spawn(move || {
                for _ in 0..4 {
                    sink(&[7u8; 320]);
                }
            })
        };
        worker.join().unwrap();

        assert_eq!(adapter.bytes_written(), 1280);
        adapter.stop_capture().unwrap();

        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn write_failure_reported_once_then_frames_dropped() {
        let delegate = Arc::new(RecordingDelegate::default());
        let adapter = CaptureAdapter::new(
            CaptureSessionToken::new(1000, "s1"),
            PathBuf::from("/dev/full"),
            PcmFormat::RECORDING,
        )
        .with_delegate(delegate.clone());

        adapter.start_capture().unwrap();
        // Bigger than the write buffer so it reaches the device immediately.
        adapter.deliver_frame(&vec![0u8; 256 * 1024]);
        adapter.deliver_frame(&[0u8; 320]);
        adapter.deliver_frame(&[0u8; 320]);

        assert_eq!(adapter.state(), CaptureState::Dropping);
        assert!(adapter.is_capturing());
        let errors = delegate.errors.lock().clone();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], DeviceError::WriteFailed(_)));

        let result = adapter.stop_capture().unwrap();
        assert!(result.metadata.write_failed);
        assert!(result.checksum.is_empty());
        assert_eq!(result.frames_dropped, 3);
        assert_eq!(result.bytes_written, 0);
        assert_eq!(delegate.errors.lock().len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn frames_during_stop_do_not_wait_for_finalize() {
        use std::io::Read;
        use std::time::{Duration, Instant};

        let dir = temp_dir("slow_close");
        let path = dir.join("1000-s1.raw");
        let status = std::process::Command::new("mkfifo").arg(&path).status().unwrap();
        assert!(status.success());

        // The reader stalls, so the final flush blocks until it drains the pipe.
        let reader = {
            let path = path.clone();
            std::thread::spawn(move || {
                let mut fifo = fs::File::open(&path).unwrap();
                std::thread::sleep(Duration::from_millis(1500));
                let mut data = Vec::new();
                fifo.read_to_end(&mut data).unwrap();
                data.len()
            })
        };

        let adapter = Arc::new(CaptureAdapter::new(
            CaptureSessionToken::new(1000, "s1"),
            path,
            PcmFormat::RECORDING,
        ));
        adapter.start_capture().unwrap();
        // Fills the pipe, then leaves 1000 bytes in the write buffer.
        adapter.deliver_frame(&vec![1u8; 64 * 1024]);
        adapter.deliver_frame(&[1u8; 1000]);

        let stopper = {
            let adapter = Arc::clone(&adapter);
            std::thread::spawn(move || adapter.stop_capture())
        };
        std::thread::sleep(Duration::from_millis(200));

        let started = Instant::now();
        adapter.deliver_frame(&[2u8; 320]);
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_millis(500), "deliver_frame blocked for {:?}", elapsed);

        // A FIFO cannot be synced, so only the timing matters here.
        let _ = stopper.join().unwrap();
        assert_eq!(adapter.state(), CaptureState::Stopped);
        assert_eq!(reader.join().unwrap(), 64 * 1024 + 1000);

        fs::remove_dir_all(&dir).ok();
    }
}
