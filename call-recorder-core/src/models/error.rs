use thiserror::Error;

/// Errors raised by the capture side of an audio device.
///
/// None of these ever reach the call engine's audio pipeline. They are
/// returned to the call-setup path or delivered to a `RecorderDelegate`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The recording file could not be created or opened for append.
    #[error("failed to open recording file: {0}")]
    OpenFailed(String),

    /// Appending a frame (or the final flush) failed after a successful open.
    #[error("failed to write recording file: {0}")]
    WriteFailed(String),

    /// Lifecycle misuse, e.g. starting an adapter that was already stopped.
    #[error("invalid capture state: {0}")]
    InvalidState(String),
}

/// Errors raised by a single playback attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("output device not ready: {0}")]
    DeviceNotReady(String),

    #[error("recording file unavailable: {0}")]
    FileUnavailable(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("output write failed: {0}")]
    WriteFailed(String),

    /// The playback thread could not be spawned or panicked.
    #[error("playback thread failed: {0}")]
    ThreadFailed(String),
}

/// Configuration could not be loaded or is inconsistent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read configuration: {0}")]
    Io(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Recording directory or sidecar failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("recordings directory error: {0}")]
    Directory(String),

    #[error("metadata error: {0}")]
    Metadata(String),
}
