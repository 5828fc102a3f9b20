use std::sync::Arc;

use crate::models::error::DeviceError;
use crate::models::recording::RecordingResult;

/// Callback form of frame delivery.
///
/// Parameter: one frame of raw PCM bytes exactly as the audio pipeline
/// produced it.
pub type FrameCallback = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Capture half of the audio device capability set.
///
/// The call engine drives it: `start_capture` / `stop_capture` from its
/// session thread, `deliver_frame` from its audio thread.
pub trait Capturer: Send + Sync {
    /// Begin a capture run.
    fn start_capture(&self) -> Result<(), DeviceError>;

    /// End the capture run and release every resource it held.
    fn stop_capture(&self) -> Result<RecordingResult, DeviceError>;

    /// Hand over one frame of PCM data.
    ///
    /// Runs on the real-time audio thread. Must not fail and must not
    /// block longer than a buffered write.
    fn deliver_frame(&self, frame: &[u8]);

    fn is_capturing(&self) -> bool;
}
