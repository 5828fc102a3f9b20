use crate::models::error::PlaybackError;
use crate::models::format::PcmFormat;

/// Platform audio output, as the playback engine needs it.
///
/// Shared across playback threads; each `open_stream` call returns a
/// stream owned by the thread that opened it.
pub trait OutputBackend: Send + Sync {
    /// Smallest buffer, in bytes, the platform accepts for `format`.
    fn min_buffer_size(&self, format: &PcmFormat) -> Result<usize, PlaybackError>;

    /// Open a streaming output with a buffer of `buffer_size` bytes.
    fn open_stream(
        &self,
        format: &PcmFormat,
        buffer_size: usize,
    ) -> Result<Box<dyn OutputStream>, PlaybackError>;
}

/// One open hardware output stream.
///
/// Not required to be `Send`: it lives and dies on the playback thread.
pub trait OutputStream {
    /// Whether the stream reached an initialized state after opening.
    fn is_ready(&self) -> bool;

    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Queue PCM bytes; may block until the device has room.
    /// Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, PlaybackError>;

    fn pause(&mut self) -> Result<(), PlaybackError>;

    fn stop(&mut self) -> Result<(), PlaybackError>;

    /// Discard anything queued but not yet played.
    fn flush(&mut self) -> Result<(), PlaybackError>;

    /// Give the hardware stream back to the platform.
    fn release(self: Box<Self>);
}
