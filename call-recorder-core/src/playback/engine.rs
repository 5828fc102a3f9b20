use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crate::models::config::RecorderConfiguration;
use crate::models::error::{ConfigError, PlaybackError};
use crate::models::format::PcmFormat;
use crate::models::token::PlaybackRequestToken;
use crate::traits::clock::{Clock, SystemClock};
use crate::traits::output::{OutputBackend, OutputStream};

/// Output buffer size for a platform-reported minimum.
///
/// Minimums below `floor` are doubled to avoid under-runs on platforms that
/// report very small buffers; anything at or above the floor is used as-is.
pub fn output_buffer_size(min_buffer_size: usize, floor: usize) -> usize {
    if min_buffer_size >= floor {
        min_buffer_size
    } else {
        min_buffer_size * 2
    }
}

/// How a streaming loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The whole file was written to the output.
    Completed,
    /// A newer request became current.
    Superseded,
    /// Reading the file or writing the output failed mid-stream.
    Failed(PlaybackError),
}

/// Summary of one playback attempt that got as far as the streaming loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackReport {
    pub token: PlaybackRequestToken,
    pub buffer_size: usize,
    pub bytes_written: u64,
    pub chunks_written: u64,
    pub outcome: PlaybackOutcome,
}

/// Handle to a playback thread. Dropping it detaches the thread.
pub struct PlaybackHandle {
    token: PlaybackRequestToken,
    handle: thread::JoinHandle<Result<PlaybackReport, PlaybackError>>,
}

impl PlaybackHandle {
    pub fn token(&self) -> &PlaybackRequestToken {
        &self.token
    }

    /// Wait for the streaming loop to end and its stream to be released.
    pub fn join(self) -> Result<PlaybackReport, PlaybackError> {
        self.handle
            .join()
            .map_err(|_| PlaybackError::ThreadFailed(format!("playback {} panicked", self.token)))?
    }
}

/// Streams raw recordings to an output backend, one request at a time.
///
/// Each `play` bumps a shared version counter; running loops compare their
/// own version against it before every write and stop once they are no
/// longer current.
pub struct PlaybackEngine {
    backend: Arc<dyn OutputBackend>,
    format: PcmFormat,
    chunk_bytes: usize,
    buffer_floor: usize,
    current: Arc<AtomicU64>,
    clock: Arc<dyn Clock>,
}

impl PlaybackEngine {
    /// Fails when `config` does not validate, e.g. a zero chunk size.
    pub fn new(backend: Arc<dyn OutputBackend>, config: &RecorderConfiguration) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            backend,
            format: config.format,
            chunk_bytes: config.playback_chunk_bytes,
            buffer_floor: config.min_buffer_floor_bytes,
            current: Arc::new(AtomicU64::new(0)),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start playing `path` on a new thread and make it the current request.
    ///
    /// Returns immediately. Any earlier playback stops within one chunk.
    pub fn play(&self, path: impl AsRef<Path>) -> Result<PlaybackHandle, PlaybackError> {
        let path = path.as_ref().to_path_buf();
        let version = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let token = PlaybackRequestToken::new(version, self.clock.now_epoch_millis(), file_name);
        log::info!("Playback requested: {}", token);

        let job = StreamJob {
            token: token.clone(),
            path,
            backend: Arc::clone(&self.backend),
            format: self.format,
            chunk_bytes: self.chunk_bytes,
            buffer_floor: self.buffer_floor,
            current: Arc::clone(&self.current),
        };

        let handle = thread::Builder::new()
            .name(format!("playback-{}", version))
            .spawn(move || job.run())
            .map_err(|e| PlaybackError::ThreadFailed(format!("failed to spawn playback thread: {}", e)))?;

        Ok(PlaybackHandle { token, handle })
    }

    /// Invalidate the current request without starting a new one.
    pub fn stop(&self) {
        let version = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Playback stop requested (version {})", version);
    }

    pub fn is_current(&self, token: &PlaybackRequestToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.version()
    }

    pub fn current_version(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Everything a playback thread needs, moved onto that thread.
struct StreamJob {
    token: PlaybackRequestToken,
    path: PathBuf,
    backend: Arc<dyn OutputBackend>,
    format: PcmFormat,
    chunk_bytes: usize,
    buffer_floor: usize,
    current: Arc<AtomicU64>,
}

impl StreamJob {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.token.version()
    }

    fn run(self) -> Result<PlaybackReport, PlaybackError> {
        let mut file = File::open(&self.path).map_err(|e| {
            log::warn!("Cannot open {}: {}", self.path.display(), e);
            PlaybackError::FileUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let min_buffer_size = self.backend.min_buffer_size(&self.format)?;
        let buffer_size = output_buffer_size(min_buffer_size, self.buffer_floor);
        log::debug!(
            "Playback {} initializing: min buffer {} → {} bytes",
            self.token,
            min_buffer_size,
            buffer_size
        );

        let mut stream = self.backend.open_stream(&self.format, buffer_size)?;
        if !stream.is_ready() {
            stream.release();
            log::error!("Output stream not initialized for {}", self.token);
            return Err(PlaybackError::DeviceNotReady(format!(
                "output stream not initialized at {} Hz",
                self.format.sample_rate
            )));
        }
        if let Err(e) = stream.play() {
            stream.release();
            log::error!("Output stream failed to start for {}: {}", self.token, e);
            return Err(PlaybackError::DeviceNotReady(e.to_string()));
        }
        log::debug!("Playback {} started", self.token);

        let mut report = PlaybackReport {
            token: self.token.clone(),
            buffer_size,
            bytes_written: 0,
            chunks_written: 0,
            outcome: PlaybackOutcome::Completed,
        };

        let mut scratch = vec![0u8; self.chunk_bytes];
        report.outcome = loop {
            let read = match file.read(&mut scratch) {
                Ok(0) => break PlaybackOutcome::Completed,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => break PlaybackOutcome::Failed(PlaybackError::ReadFailed(e.to_string())),
            };
            if !self.is_current() {
                break PlaybackOutcome::Superseded;
            }
            if let Err(e) = write_chunk(stream.as_mut(), &scratch[..read]) {
                break PlaybackOutcome::Failed(e);
            }
            report.bytes_written += read as u64;
            report.chunks_written += 1;
        };

        shutdown(stream);

        match report.outcome {
            PlaybackOutcome::Failed(ref e) => {
                log::warn!("Playback {} ended early: {}", self.token, e)
            }
            ref outcome => log::info!(
                "Playback {} ended ({:?}, {} bytes)",
                self.token,
                outcome,
                report.bytes_written
            ),
        }
        Ok(report)
    }
}

fn write_chunk(stream: &mut dyn OutputStream, mut data: &[u8]) -> Result<(), PlaybackError> {
    while !data.is_empty() {
        let accepted = stream.write(data)?;
        if accepted == 0 {
            return Err(PlaybackError::WriteFailed("output accepted no data".into()));
        }
        data = &data[accepted..];
    }
    Ok(())
}

/// Pause, stop, flush, release; always in that order.
fn shutdown(mut stream: Box<dyn OutputStream>) {
    if let Err(e) = stream.pause() {
        log::warn!("Output pause failed: {}", e);
    }
    if let Err(e) = stream.stop() {
        log::warn!("Output stop failed: {}", e);
    }
    if let Err(e) = stream.flush() {
        log::warn!("Output flush failed: {}", e);
    }
    stream.release();
}
