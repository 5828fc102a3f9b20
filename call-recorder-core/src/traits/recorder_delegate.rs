use std::path::Path;

use crate::models::error::DeviceError;
use crate::models::recording::RecordingResult;

/// Event sink for capture notifications.
///
/// `on_capture_started` and `on_capture_finished` are called from the
/// control thread. `on_error` may be called from the audio thread, so
/// implementations must return quickly and never block.
pub trait RecorderDelegate: Send + Sync {
    fn on_capture_started(&self, file_path: &Path);

    /// Called at most once per error kind for a capture run.
    fn on_error(&self, error: &DeviceError);

    fn on_capture_finished(&self, result: &RecordingResult);
}
