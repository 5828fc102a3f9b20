//! # call-recorder-core
//!
//! Platform-agnostic core of the call audio recorder.
//!
//! Captures the raw microphone frames a call engine delivers to its audio
//! device into a timestamped headerless PCM file, and replays those files
//! through an output backend with single-active-playback cancellation.
//! Hardware backends (e.g. cpal) implement `OutputBackend` and drive a
//! `Capturer` from their audio thread.
//!
//! ## Architecture
//!
//! ```text
//! call-recorder-core (this crate)
//! ├── traits/     ← Capturer, Renderer, AudioDevice, OutputBackend, RecorderDelegate, Clock
//! ├── models/     ← DeviceError, PlaybackError, PcmFormat, tokens, configuration, results
//! ├── capture/    ← CaptureAdapter, RecordingDevice, PlaceholderDevice
//! ├── registry/   ← AudioDeviceRegistry
//! ├── session/    ← CallSessionRecorder (lifecycle wiring)
//! ├── playback/   ← PlaybackEngine, MemoryOutputBackend
//! └── storage/    ← RawFileWriter, RecordingLibrary, metadata sidecars
//! ```

pub mod capture;
pub mod models;
pub mod playback;
pub mod registry;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use capture::adapter::CaptureAdapter;
pub use capture::device::{NullCapturer, PlaceholderDevice, RecordingDevice};
pub use models::config::RecorderConfiguration;
pub use models::error::{ConfigError, DeviceError, PlaybackError, StorageError};
pub use models::format::PcmFormat;
pub use models::recording::{RecordingInfo, RecordingMetadata, RecordingResult};
pub use models::state::{CaptureDiagnostics, CaptureState};
pub use models::token::{CaptureSessionToken, PlaybackRequestToken};
pub use playback::engine::{output_buffer_size, PlaybackEngine, PlaybackHandle, PlaybackOutcome, PlaybackReport};
pub use playback::memory::{MemoryOutputBackend, MemoryStreamRecord, StreamEvent};
pub use registry::device_registry::{AudioDeviceRegistry, SharedDevice};
pub use session::recorder::CallSessionRecorder;
pub use storage::library::RecordingLibrary;
pub use storage::raw_writer::RawFileWriter;
pub use traits::audio_device::AudioDevice;
pub use traits::capturer::{Capturer, FrameCallback};
pub use traits::clock::{Clock, FixedClock, SystemClock};
pub use traits::output::{OutputBackend, OutputStream};
pub use traits::recorder_delegate::RecorderDelegate;
pub use traits::renderer::{Renderer, SilentRenderer};
