use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::format::PcmFormat;

/// Size of each read/write transfer in the playback loop.
pub const DEFAULT_PLAYBACK_CHUNK_BYTES: usize = 16000;

/// Output buffers reported below this size are doubled.
pub const DEFAULT_MIN_BUFFER_FLOOR_BYTES: usize = 6000;

/// Configuration for the recorder and the playback engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfiguration {
    /// Application-private directory holding `<epoch>-<session>.raw` files.
    pub recordings_dir: PathBuf,

    /// Sample format used for both capture and playback (default: s16 mono 44100 Hz).
    pub format: PcmFormat,

    /// Bytes read from the file and written to the output per loop iteration (default: 16000).
    pub playback_chunk_bytes: usize,

    /// Safety floor for the output buffer size (default: 6000).
    pub min_buffer_floor_bytes: usize,
}

impl RecorderConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample rate must be positive".into()));
        }
        if self.format.bit_depth != 16 {
            return Err(ConfigError::Invalid(format!(
                "unsupported bit depth: {}",
                self.format.bit_depth
            )));
        }
        if self.format.channels != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported channel count: {}",
                self.format.channels
            )));
        }
        if self.playback_chunk_bytes == 0 {
            return Err(ConfigError::Invalid("playback chunk size must be positive".into()));
        }
        if self.playback_chunk_bytes % self.format.bytes_per_frame() != 0 {
            return Err(ConfigError::Invalid(format!(
                "playback chunk size {} is not a whole number of frames",
                self.playback_chunk_bytes
            )));
        }
        Ok(())
    }

    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Self =
            serde_json::from_str(&json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_recordings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.recordings_dir = dir.into();
        self
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("recordings"),
            format: PcmFormat::RECORDING,
            playback_chunk_bytes: DEFAULT_PLAYBACK_CHUNK_BYTES,
            min_buffer_floor_bytes: DEFAULT_MIN_BUFFER_FLOOR_BYTES,
        }
    }
}
