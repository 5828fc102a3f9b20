//! # call-recorder-cpal
//!
//! cpal hardware backend for call-recorder.
//!
//! Provides:
//! - `CpalOutputBackend`: `OutputBackend` for the playback engine, on the default (or a named) output device
//! - `CpalMicPump`: microphone capture that feeds s16le mono frames to any `FrameCallback`
//! - `pcm`: sample conversion helpers shared by both
//! - `cli`: argument parsing and logging setup for the `call-recorder` binary
//!
//! ## Platform Requirements
//! The `cpal` feature links the platform audio libraries (ALSA on Linux,
//! CoreAudio on macOS, WASAPI on Windows).
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use call_recorder_core::{PlaybackEngine, RecorderConfiguration};
//! use call_recorder_cpal::CpalOutputBackend;
//!
//! let config = RecorderConfiguration::default();
//! let engine = PlaybackEngine::new(Arc::new(CpalOutputBackend::default_device()), &config)?;
//! engine.play("recordings/1000-s1.raw")?;
//! ```

pub mod cli;
pub mod error;
pub mod pcm;

#[cfg(feature = "cpal")]
pub mod cpal_input;
#[cfg(feature = "cpal")]
pub mod cpal_output;

pub use error::BackendError;

#[cfg(feature = "cpal")]
pub use cpal_input::CpalMicPump;
#[cfg(feature = "cpal")]
pub use cpal_output::CpalOutputBackend;
