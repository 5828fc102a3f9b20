use std::sync::Arc;

use crate::capture::adapter::CaptureAdapter;
use crate::capture::device::RecordingDevice;
use crate::models::config::RecorderConfiguration;
use crate::models::error::StorageError;
use crate::models::format::PcmFormat;
use crate::models::recording::RecordingResult;
use crate::models::token::CaptureSessionToken;
use crate::registry::device_registry::{AudioDeviceRegistry, SharedDevice};
use crate::storage::library::RecordingLibrary;
use crate::storage::metadata;
use crate::traits::clock::{Clock, SystemClock};
use crate::traits::recorder_delegate::RecorderDelegate;

/// Connects call-session lifecycle events to the device registry.
///
/// ```text
/// session about to connect → install RecordingDevice (if none active) → call engine
/// session disconnected     → stop capture → metadata sidecar → clear registry
/// ```
///
/// Lives on the session-setup thread; every mutating method takes `&mut self`.
pub struct CallSessionRecorder {
    registry: AudioDeviceRegistry,
    library: RecordingLibrary,
    format: PcmFormat,
    clock: Arc<dyn Clock>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

impl CallSessionRecorder {
    /// Create a recorder writing into `config.recordings_dir`, creating the
    /// directory if needed.
    pub fn new(config: &RecorderConfiguration, registry: AudioDeviceRegistry) -> Result<Self, StorageError> {
        let library = RecordingLibrary::new(config.recordings_dir.clone());
        library.ensure_dir()?;
        Ok(Self {
            registry,
            library,
            format: config.format,
            clock: Arc::new(SystemClock),
            delegate: None,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn registry(&self) -> &AudioDeviceRegistry {
        &self.registry
    }

    pub fn library(&self) -> &RecordingLibrary {
        &self.library
    }

    /// Make sure a recording device is installed before the session
    /// connects, and return the device the call engine should use.
    ///
    /// An already-active recording device is kept as-is, so running this
    /// twice never starts a second capture.
    pub fn on_session_connecting(&mut self, session_id: &str) -> SharedDevice {
        let library = &self.library;
        let format = self.format;
        let clock = &self.clock;
        let delegate = self.delegate.clone();

        let (device, installed) = self.registry.install_if_needed(|| {
            let token = CaptureSessionToken::new(clock.now_epoch_secs(), session_id);
            let path = library.path_for(&token);
            log::info!("Setting up recording device: {}", path.display());

            let mut adapter = CaptureAdapter::new(token, path, format);
            if let Some(delegate) = delegate {
                adapter = adapter.with_delegate(delegate);
            }
            Arc::new(RecordingDevice::new(adapter))
        });

        if !installed {
            log::info!("Audio device already installed: {}", device.name());
        }
        device
    }

    /// Tear down the active device. Returns the finished recording when the
    /// device had been capturing.
    pub fn on_session_disconnected(&mut self) -> Option<RecordingResult> {
        let device = self.registry.clear()?;
        if device.is_placeholder() {
            return None;
        }

        let capturer = device.capturer();
        if !capturer.is_capturing() {
            log::info!("Device {} never captured; nothing to finalize", device.name());
            return None;
        }

        match capturer.stop_capture() {
            Ok(result) => {
                if let Err(e) = metadata::write_metadata(&result.metadata, &result.file_path) {
                    log::warn!("Recording kept without sidecar: {}", e);
                }
                Some(result)
            }
            Err(e) => {
                log::warn!("Failed to finalize recording on {}: {}", device.name(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::DeviceError;
    use crate::traits::clock::FixedClock;
    use std::fs;

    fn recorder(name: &str, epoch: i64) -> CallSessionRecorder {
        let dir = std::env::temp_dir().join(format!("call_recorder_session_{}_{}", std::process::id(), name));
        fs::remove_dir_all(&dir).ok();
        let config = RecorderConfiguration::default().with_recordings_dir(dir);
        CallSessionRecorder::new(&config, AudioDeviceRegistry::with_placeholder())
            .unwrap()
            .with_clock(Arc::new(FixedClock { epoch_secs: epoch }))
    }

    #[test]
    fn connecting_replaces_placeholder() {
        let mut recorder = recorder("replace", 1000);
        assert!(recorder.registry().needs_device());

        let device = recorder.on_session_connecting("s1");
        assert!(!device.is_placeholder());
        assert_eq!(device.name(), "recorder:1000-s1");
        assert!(Arc::ptr_eq(&device, &recorder.registry().get().unwrap()));

        fs::remove_dir_all(recorder.library().dir()).ok();
    }

    #[test]
    fn connecting_twice_keeps_active_device() {
        let mut recorder = recorder("twice", 1000);
        let first = recorder.on_session_connecting("s1");
        first.capturer().start_capture().unwrap();
        let second = recorder.on_session_connecting("s1");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(recorder.library().list().unwrap().len(), 1);

        recorder.on_session_disconnected();
        fs::remove_dir_all(recorder.library().dir()).ok();
    }

    #[test]
    fn disconnect_finalizes_and_writes_sidecar() {
        let mut recorder = recorder("finalize", 1000);
        let device = recorder.on_session_connecting("s1");
        device.capturer().start_capture().unwrap();
        device.capturer().deliver_frame(&[1u8; 320]);

        let result = recorder.on_session_disconnected().unwrap();
        assert_eq!(result.bytes_written, 320);
        assert!(recorder.registry().get().is_none());

        let sidecar = metadata::read_metadata(&result.file_path).unwrap();
        assert_eq!(sidecar.bytes, 320);
        assert_eq!(sidecar.checksum, result.checksum);

        fs::remove_dir_all(recorder.library().dir()).ok();
    }

    #[test]
    fn disconnect_without_capture_returns_none() {
        let mut recorder = recorder("idle", 1000);
        recorder.on_session_connecting("s1");
        assert!(recorder.on_session_disconnected().is_none());
        assert!(recorder.registry().needs_device());
        assert!(recorder.on_session_disconnected().is_none());

        fs::remove_dir_all(recorder.library().dir()).ok();
    }

    #[test]
    fn next_call_gets_fresh_device() {
        let mut recorder = recorder("fresh", 1000);
        let first = recorder.on_session_connecting("s1");
        first.capturer().start_capture().unwrap();
        recorder.on_session_disconnected().unwrap();

        recorder.clock = Arc::new(FixedClock { epoch_secs: 2000 });
        let second = recorder.on_session_connecting("s1");
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.name(), "recorder:2000-s1");
        second.capturer().start_capture().unwrap();

        fs::remove_dir_all(recorder.library().dir()).ok();
    }

    #[test]
    fn failed_open_still_tears_down_cleanly() {
        let mut recorder = recorder("open_fail", 1000);
        fs::remove_dir_all(recorder.library().dir()).unwrap();

        let device = recorder.on_session_connecting("s1");
        assert!(matches!(
            device.capturer().start_capture(),
            Err(DeviceError::OpenFailed(_))
        ));
        assert!(recorder.on_session_disconnected().is_none());
        assert!(recorder.registry().needs_device());

        recorder.library().ensure_dir().unwrap();
        let next = recorder.on_session_connecting("s2");
        assert!(!Arc::ptr_eq(&device, &next));
        next.capturer().start_capture().unwrap();
        assert!(recorder.on_session_disconnected().is_some());

        fs::remove_dir_all(recorder.library().dir()).ok();
    }
}
