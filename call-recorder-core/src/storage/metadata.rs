use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::StorageError;
use crate::models::recording::RecordingMetadata;

/// `1000-s1.raw` → `1000-s1.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar next to the recording.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| StorageError::Metadata(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(recording_path), json)
        .map_err(|e| StorageError::Metadata(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read the JSON sidecar of a recording.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, StorageError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| StorageError::Metadata(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| StorageError::Metadata(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format::PcmFormat;
    use crate::models::token::CaptureSessionToken;

    #[test]
    fn sidecar_sits_next_to_recording() {
        let path = Path::new("/data/recordings/1000-s1.raw");
        assert_eq!(
            metadata_path(path),
            PathBuf::from("/data/recordings/1000-s1.metadata.json")
        );
    }

    #[test]
    fn write_then_read() {
        let dir = std::env::temp_dir().join(format!("call_recorder_meta_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let recording = dir.join("1000-s1.raw");

        let token = CaptureSessionToken::new(1000, "s1");
        let metadata = RecordingMetadata::new(
            &token,
            &recording.to_string_lossy(),
            &PcmFormat::RECORDING,
            960,
            "abc123",
            false,
        );
        write_metadata(&metadata, &recording).unwrap();

        let loaded = read_metadata(&recording).unwrap();
        assert_eq!(loaded, metadata);
        assert_eq!(loaded.session_id, "s1");
        assert_eq!(loaded.started_at, 1000);
        assert_eq!(loaded.sample_rate, 44100);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_sidecar_is_an_error() {
        let path = std::env::temp_dir().join("call_recorder_no_such_recording.raw");
        assert!(matches!(read_metadata(&path), Err(StorageError::Metadata(_))));
    }
}
