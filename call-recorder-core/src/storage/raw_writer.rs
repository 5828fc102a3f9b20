use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::DeviceError;

/// Buffer in front of the file so each frame append is a memcpy in the
/// common case.
const WRITE_BUFFER_BYTES: usize = 64 * 1024;

/// Append-only writer for one headerless PCM recording.
///
/// ## File Format
///
/// ```text
/// [raw s16le PCM, frame after frame, exactly as delivered]
/// ```
///
/// A SHA-256 digest is accumulated as bytes are accepted so `close` does
/// not have to read the file back.
pub struct RawFileWriter {
    file_path: PathBuf,
    file: Option<BufWriter<File>>,
    hasher: Sha256,
    total_bytes_written: u64,
}

impl RawFileWriter {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            file: None,
            hasher: Sha256::new(),
            total_bytes_written: 0,
        }
    }

    /// Open the file for append. The parent directory must already exist.
    pub fn open(&mut self) -> Result<(), DeviceError> {
        if self.file.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|e| DeviceError::OpenFailed(format!("{}: {}", self.file_path.display(), e)))?;

        self.file = Some(BufWriter::with_capacity(WRITE_BUFFER_BYTES, file));
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Append `data` verbatim.
    pub fn write(&mut self, data: &[u8]) -> Result<(), DeviceError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| DeviceError::WriteFailed("file is not open for writing".into()))?;
        file.write_all(data)
            .map_err(|e| DeviceError::WriteFailed(e.to_string()))?;
        self.hasher.update(data);
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }

    /// Flush, sync and close the file. Returns the hex SHA-256 of the bytes
    /// accepted by `write`.
    pub fn close(&mut self) -> Result<String, DeviceError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| DeviceError::InvalidState("file is not open".into()))?;

        file.flush()
            .map_err(|e| DeviceError::WriteFailed(format!("flush failed: {}", e)))?;
        let file = file
            .into_inner()
            .map_err(|e| DeviceError::WriteFailed(format!("flush failed: {}", e.error())))?;
        file.sync_all()
            .map_err(|e| DeviceError::WriteFailed(format!("sync failed: {}", e)))?;

        let digest = std::mem::take(&mut self.hasher).finalize();
        Ok(hex_encode(&digest))
    }

    /// Close the handle without reporting errors. Used once writing has
    /// already failed; the implicit flush on drop is best-effort.
    pub fn abandon(&mut self) {
        self.file = None;
    }

    /// Bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
