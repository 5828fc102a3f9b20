use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::PlaybackError;
use crate::models::format::PcmFormat;
use crate::traits::output::{OutputBackend, OutputStream};

/// Calls observed on one memory stream, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Opened { buffer_size: usize },
    Play,
    Write(usize),
    Pause,
    Stop,
    Flush,
    Release,
}

/// Everything one stream saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStreamRecord {
    pub buffer_size: usize,
    pub events: Vec<StreamEvent>,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct OutputLog {
    streams: Vec<MemoryStreamRecord>,
    /// Bytes from every stream, interleaved in the order they were written.
    output: Vec<u8>,
}

/// Headless output backend that records what would have been played.
///
/// Used for dry runs and tests; `min_buffer_size` reports a fixed value so
/// buffer sizing can be checked.
#[derive(Debug, Clone)]
pub struct MemoryOutputBackend {
    min_buffer_size: usize,
    ready: bool,
    log: Arc<Mutex<OutputLog>>,
}

impl MemoryOutputBackend {
    pub fn new(min_buffer_size: usize) -> Self {
        Self {
            min_buffer_size,
            ready: true,
            log: Arc::new(Mutex::new(OutputLog::default())),
        }
    }

    /// Backend whose streams never reach the ready state.
    pub fn not_ready(min_buffer_size: usize) -> Self {
        Self {
            ready: false,
            ..Self::new(min_buffer_size)
        }
    }

    pub fn streams(&self) -> Vec<MemoryStreamRecord> {
        self.log.lock().streams.clone()
    }

    /// All bytes written to any stream, in write order.
    pub fn output(&self) -> Vec<u8> {
        self.log.lock().output.clone()
    }
}

impl OutputBackend for MemoryOutputBackend {
    fn min_buffer_size(&self, _format: &PcmFormat) -> Result<usize, PlaybackError> {
        Ok(self.min_buffer_size)
    }

    fn open_stream(
        &self,
        _format: &PcmFormat,
        buffer_size: usize,
    ) -> Result<Box<dyn OutputStream>, PlaybackError> {
        let mut log = self.log.lock();
        log.streams.push(MemoryStreamRecord {
            buffer_size,
            events: vec![StreamEvent::Opened { buffer_size }],
            data: Vec::new(),
        });
        Ok(Box::new(MemoryOutputStream {
            index: log.streams.len() - 1,
            ready: self.ready,
            log: Arc::clone(&self.log),
        }))
    }
}

struct MemoryOutputStream {
    index: usize,
    ready: bool,
    log: Arc<Mutex<OutputLog>>,
}

impl MemoryOutputStream {
    fn record(&self, event: StreamEvent) {
        self.log.lock().streams[self.index].events.push(event);
    }
}

impl OutputStream for MemoryOutputStream {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.record(StreamEvent::Play);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PlaybackError> {
        let mut log = self.log.lock();
        let stream = &mut log.streams[self.index];
        stream.events.push(StreamEvent::Write(data.len()));
        stream.data.extend_from_slice(data);
        log.output.extend_from_slice(data);
        Ok(data.len())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.record(StreamEvent::Pause);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        self.record(StreamEvent::Stop);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PlaybackError> {
        self.record(StreamEvent::Flush);
        Ok(())
    }

    fn release(self: Box<Self>) {
        self.record(StreamEvent::Release);
    }
}
