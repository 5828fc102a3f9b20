use serde::{Deserialize, Serialize};

/// Sample format shared by the capture adapter and the playback engine.
///
/// Recordings carry no header, so writer and reader must agree on this
/// exactly or playback renders at the wrong speed and pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl PcmFormat {
    /// Signed 16-bit little-endian mono at 44.1 kHz.
    pub const RECORDING: PcmFormat = PcmFormat {
        sample_rate: 44100,
        channels: 1,
        bit_depth: 16,
    };

    pub fn bytes_per_sample(&self) -> usize {
        self.bit_depth as usize / 8
    }

    /// Bytes per sample frame (one sample for every channel).
    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }

    pub fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.bytes_per_frame() as u64
    }

    /// Playback duration of `bytes` of audio in this format.
    pub fn duration_secs(&self, bytes: u64) -> f64 {
        let rate = self.bytes_per_second();
        if rate == 0 {
            return 0.0;
        }
        bytes as f64 / rate as f64
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::RECORDING
    }
}
