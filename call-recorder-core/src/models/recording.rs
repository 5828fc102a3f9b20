use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::PcmFormat;
use super::token::CaptureSessionToken;

/// Returned by `stop_capture` once the recording file is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub bytes_written: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub duration_secs: f64,
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// JSON sidecar describing a finished recording.
///
/// The raw file has no header, so this is the only place the format is
/// written down next to the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub session_id: String,
    pub started_at: i64,
    pub created_at: String,
    pub file_path: String,
    pub bytes: u64,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub checksum: String,
    pub write_failed: bool,
}

impl RecordingMetadata {
    pub fn new(
        token: &CaptureSessionToken,
        file_path: &str,
        format: &PcmFormat,
        bytes: u64,
        checksum: &str,
        write_failed: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: token.session_id().to_string(),
            started_at: token.started_at(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            bytes,
            duration_secs: format.duration_secs(bytes),
            sample_rate: format.sample_rate,
            channels: format.channels,
            bit_depth: format.bit_depth,
            checksum: checksum.to_string(),
            write_failed,
        }
    }
}

/// One entry of the recordings directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingInfo {
    pub file_path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    /// Parsed from the file name; `None` for files not named `<epoch>-<session>.raw`.
    pub started_at: Option<i64>,
    pub session_id: Option<String>,
}
