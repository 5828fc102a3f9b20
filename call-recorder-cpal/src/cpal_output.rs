//! cpal implementation of the playback engine's output seam.
//!
//! cpal is pull-based; the engine pushes. A bounded sample queue sits in
//! between: `write` blocks until the device callback has made room, the
//! callback drains it and plays silence on under-run or while paused.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use call_recorder_core::{OutputBackend, OutputStream, PcmFormat, PlaybackError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig, SupportedBufferSize};
use parking_lot::{Condvar, Mutex};

use crate::error::BackendError;
use crate::pcm::PcmDecoder;

/// Buffer length assumed when the device does not report a range.
const FALLBACK_BUFFER_MS: usize = 20;

/// How long `write` waits between checks of the stream's error flag.
const WRITE_POLL: Duration = Duration::from_millis(100);

/// Output backend over a cpal device. `None` selects the host default.
#[derive(Debug, Clone, Default)]
pub struct CpalOutputBackend {
    device_name: Option<String>,
}

impl CpalOutputBackend {
    pub fn default_device() -> Self {
        Self { device_name: None }
    }

    pub fn named(device_name: impl Into<String>) -> Self {
        Self {
            device_name: Some(device_name.into()),
        }
    }

    /// Names of every output device on the default host.
    pub fn list_devices() -> Result<Vec<String>, BackendError> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| BackendError::Stream(format!("failed to enumerate devices: {}", e)))?
            .filter_map(|d| d.name().ok())
            .collect::<Vec<_>>();
        log::debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    fn device(&self) -> Result<cpal::Device, BackendError> {
        let host = cpal::default_host();
        match &self.device_name {
            Some(name) => {
                let mut devices = host
                    .output_devices()
                    .map_err(|e| BackendError::Stream(format!("failed to enumerate devices: {}", e)))?;
                devices
                    .find(|d| d.name().ok().as_deref() == Some(name.as_str()))
                    .ok_or_else(|| BackendError::DeviceNotFound(name.clone()))
            }
            None => host
                .default_output_device()
                .ok_or_else(|| BackendError::DeviceNotFound("default".into())),
        }
    }

    /// First device configuration that can run at the recording's rate with
    /// a sample type we convert to.
    fn find_config(
        device: &cpal::Device,
        format: &PcmFormat,
    ) -> Result<cpal::SupportedStreamConfig, BackendError> {
        let rate = format.sample_rate;
        let mut ranges = device
            .supported_output_configs()
            .map_err(|e| BackendError::UnsupportedConfig(e.to_string()))?
            .filter(|c| c.min_sample_rate().0 <= rate && c.max_sample_rate().0 >= rate)
            .filter(|c| matches!(c.sample_format(), SampleFormat::F32 | SampleFormat::I16))
            .collect::<Vec<_>>();

        // Fewest channels first: mono is duplicated to every channel.
        ranges.sort_by_key(|c| c.channels());
        ranges
            .into_iter()
            .next()
            .map(|c| c.with_sample_rate(cpal::SampleRate(rate)))
            .ok_or_else(|| BackendError::UnsupportedConfig(format!("no output configuration at {} Hz", rate)))
    }
}

impl OutputBackend for CpalOutputBackend {
    fn min_buffer_size(&self, format: &PcmFormat) -> Result<usize, PlaybackError> {
        let device = self.device()?;
        let config = Self::find_config(&device, format)?;
        let bytes = match config.buffer_size() {
            SupportedBufferSize::Range { min, .. } if *min > 0 => *min as usize * format.bytes_per_frame(),
            _ => format.bytes_per_second() as usize * FALLBACK_BUFFER_MS / 1000,
        };
        log::debug!("Minimum output buffer for {:?}: {} bytes", format, bytes);
        Ok(bytes)
    }

    fn open_stream(
        &self,
        format: &PcmFormat,
        buffer_size: usize,
    ) -> Result<Box<dyn OutputStream>, PlaybackError> {
        let device = self.device()?;
        let supported = Self::find_config(&device, format)?;
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = Arc::new(SampleQueue::new(buffer_size / format.bytes_per_sample()));
        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, Arc::clone(&queue)),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, Arc::clone(&queue)),
            other => Err(BackendError::UnsupportedConfig(format!("sample format {:?}", other))),
        };

        let stream = match stream {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("Failed to build output stream: {}", e);
                None
            }
        };

        log::info!(
            "Opened output stream: {} Hz, {} channel(s), {} byte buffer",
            config.sample_rate.0,
            config.channels,
            buffer_size
        );
        Ok(Box::new(CpalOutputStream {
            stream,
            queue,
            decoder: PcmDecoder::new(),
            pending: Vec::new(),
        }))
    }
}

/// Bounded mono sample queue shared with the device callback.
struct SampleQueue {
    samples: Mutex<VecDeque<i16>>,
    space: Condvar,
    capacity: usize,
    playing: AtomicBool,
    failed: AtomicBool,
}

impl SampleQueue {
    fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            space: Condvar::new(),
            capacity: capacity.max(1),
            playing: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    queue: Arc<SampleQueue>,
) -> Result<cpal::Stream, BackendError>
where
    T: SizedSample + FromSample<i16> + Send + 'static,
{
    let channels = config.channels as usize;
    let error_queue = Arc::clone(&queue);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let playing = queue.playing.load(Ordering::Acquire);
                let mut samples = queue.samples.lock();
                for frame in data.chunks_mut(channels) {
                    let sample = if playing { samples.pop_front().unwrap_or(0) } else { 0 };
                    let value = <T as FromSample<i16>>::from_sample_(sample);
                    frame.iter_mut().for_each(|s| *s = value);
                }
                drop(samples);
                queue.space.notify_all();
            },
            move |err| {
                log::error!("Output stream error: {}", err);
                error_queue.failed.store(true, Ordering::Release);
                error_queue.space.notify_all();
            },
            None,
        )
        .map_err(|e| BackendError::Stream(e.to_string()))
}

struct CpalOutputStream {
    stream: Option<cpal::Stream>,
    queue: Arc<SampleQueue>,
    decoder: PcmDecoder,
    pending: Vec<i16>,
}

impl CpalOutputStream {
    fn stream(&self) -> Result<&cpal::Stream, PlaybackError> {
        self.stream
            .as_ref()
            .ok_or_else(|| PlaybackError::DeviceNotReady("stream was not built".into()))
    }
}

impl OutputStream for CpalOutputStream {
    fn is_ready(&self) -> bool {
        self.stream.is_some() && !self.queue.failed.load(Ordering::Acquire)
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.stream()?
            .play()
            .map_err(|e| PlaybackError::DeviceNotReady(e.to_string()))?;
        self.queue.playing.store(true, Ordering::Release);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PlaybackError> {
        self.pending.clear();
        self.decoder.decode_into(data, &mut self.pending);

        let mut offset = 0;
        while offset < self.pending.len() {
            let mut samples = self.queue.samples.lock();
            while samples.len() >= self.queue.capacity {
                if self.queue.failed.load(Ordering::Acquire) {
                    return Err(PlaybackError::WriteFailed("output stream reported an error".into()));
                }
                if !self.queue.playing.load(Ordering::Acquire) {
                    return Err(PlaybackError::WriteFailed("output stream is not playing".into()));
                }
                self.queue.space.wait_for(&mut samples, WRITE_POLL);
            }
            let room = self.queue.capacity - samples.len();
            let end = (offset + room).min(self.pending.len());
            samples.extend(&self.pending[offset..end]);
            offset = end;
        }
        Ok(data.len())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.queue.playing.store(false, Ordering::Release);
        self.stream()?
            .pause()
            .map_err(|e| PlaybackError::WriteFailed(e.to_string()))
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        self.queue.playing.store(false, Ordering::Release);
        self.decoder.reset();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PlaybackError> {
        self.queue.samples.lock().clear();
        self.queue.space.notify_all();
        Ok(())
    }

    fn release(mut self: Box<Self>) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            log::debug!("Output stream released");
        }
    }
}
