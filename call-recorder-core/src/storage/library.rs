use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::StorageError;
use crate::models::recording::RecordingInfo;
use crate::models::token::{CaptureSessionToken, RECORDING_EXTENSION};

/// The application-private directory that holds raw recordings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingLibrary {
    dir: PathBuf,
}

impl RecordingLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| StorageError::Directory(format!("{}: {}", self.dir.display(), e)))
    }

    /// Where the recording for `token` lives.
    pub fn path_for(&self, token: &CaptureSessionToken) -> PathBuf {
        self.dir.join(token.file_name())
    }

    /// Recordings sorted by file name, which for `<epoch>-<session>.raw`
    /// is oldest first.
    pub fn list(&self) -> Result<Vec<RecordingInfo>, StorageError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| StorageError::Directory(format!("{}: {}", self.dir.display(), e)))?;

        let mut recordings = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::Directory(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORDING_EXTENSION) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let token = CaptureSessionToken::parse_file_name(&file_name);
            recordings.push(RecordingInfo {
                file_path: path,
                size_bytes: metadata.len(),
                started_at: token.as_ref().map(|t| t.started_at()),
                session_id: token.map(|t| t.session_id().to_string()),
                file_name,
            });
        }

        recordings.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(recordings)
    }

    /// Resolve a file name selected from the listing to a path inside the
    /// library. Names with directory components are rejected.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let candidate = Path::new(file_name);
        if candidate.file_name()? != candidate.as_os_str() {
            return None;
        }
        Some(self.dir.join(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_library(name: &str) -> RecordingLibrary {
        let dir = std::env::temp_dir().join(format!("call_recorder_lib_{}_{}", std::process::id(), name));
        fs::remove_dir_all(&dir).ok();
        RecordingLibrary::new(dir)
    }

    #[test]
    fn path_for_token() {
        let library = RecordingLibrary::new("/data/rec");
        let token = CaptureSessionToken::new(1000, "s1");
        assert_eq!(library.path_for(&token), PathBuf::from("/data/rec/1000-s1.raw"));
    }

    #[test]
    fn list_sorted_and_filtered() {
        let library = temp_library("list");
        library.ensure_dir().unwrap();
        let dir = library.dir().to_path_buf();

        fs::write(dir.join("2000-s2.raw"), [0u8; 4]).unwrap();
        fs::write(dir.join("1000-s1.raw"), [0u8; 960]).unwrap();
        fs::write(dir.join("1000-s1.metadata.json"), "{}").unwrap();
        fs::write(dir.join("manual.raw"), [0u8; 2]).unwrap();
        fs::create_dir_all(dir.join("3000-dir.raw")).unwrap();

        let recordings = library.list().unwrap();
        let names: Vec<&str> = recordings.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["1000-s1.raw", "2000-s2.raw", "manual.raw"]);

        assert_eq!(recordings[0].size_bytes, 960);
        assert_eq!(recordings[0].started_at, Some(1000));
        assert_eq!(recordings[0].session_id.as_deref(), Some("s1"));
        assert_eq!(recordings[2].started_at, None);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn list_missing_directory_fails() {
        let library = temp_library("absent");
        assert!(matches!(library.list(), Err(StorageError::Directory(_))));
    }

    #[test]
    fn resolve_rejects_traversal() {
        let library = RecordingLibrary::new("/data/rec");
        assert_eq!(library.resolve("1000-s1.raw"), Some(PathBuf::from("/data/rec/1000-s1.raw")));
        assert_eq!(library.resolve("../etc/passwd"), None);
        assert_eq!(library.resolve("a/b.raw"), None);
        assert_eq!(library.resolve(".."), None);
    }
}
