use call_recorder_core::PlaybackError;
use thiserror::Error;

/// Errors from the cpal backend outside the playback engine's own taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("unsupported device configuration: {0}")]
    UnsupportedConfig(String),

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("audio thread error: {0}")]
    Thread(String),
}

/// Any backend failure while preparing output means the device is not ready.
impl From<BackendError> for PlaybackError {
    fn from(e: BackendError) -> Self {
        PlaybackError::DeviceNotReady(e.to_string())
    }
}
