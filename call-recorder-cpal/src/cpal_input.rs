//! Microphone capture over cpal, delivered as s16le mono frames.
//!
//! `cpal::Stream` is not `Send`, so the stream lives on a dedicated thread
//! for its whole life; the pump only holds a stop channel and the join
//! handle.

use std::sync::mpsc;
use std::thread;

use call_recorder_core::{FrameCallback, PcmFormat};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig};

use crate::error::BackendError;
use crate::pcm::{downmix_to_mono, f32_to_s16le, resample};

/// Feeds the default input device into a frame sink until stopped.
pub struct CpalMicPump {
    stop_tx: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl CpalMicPump {
    /// Open the default input device and start delivering frames converted
    /// to `format` (mono s16le at `format.sample_rate`).
    ///
    /// Returns once the stream is running, or with the error that kept it
    /// from starting.
    pub fn start(format: PcmFormat, sink: FrameCallback) -> Result<Self, BackendError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), BackendError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("mic-pump".into())
            .spawn(move || {
                let stream = match open_input(format, sink) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(BackendError::Stream(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));
                log::debug!("Microphone capture thread started");

                // Either an explicit stop or the pump being dropped.
                let _ = stop_rx.recv();
                drop(stream);
                log::debug!("Microphone capture thread stopped");
            })
            .map_err(|e| BackendError::Thread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { stop_tx, handle }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(BackendError::Thread("capture thread exited before starting".into()))
            }
        }
    }

    /// Stop the stream and wait for the capture thread to exit.
    pub fn stop(self) -> Result<(), BackendError> {
        let _ = self.stop_tx.send(());
        self.handle
            .join()
            .map_err(|_| BackendError::Thread("capture thread panicked".into()))
    }
}

fn open_input(format: PcmFormat, sink: FrameCallback) -> Result<cpal::Stream, BackendError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| BackendError::DeviceNotFound("default input".into()))?;
    log::info!(
        "Using input device: {}",
        device.name().unwrap_or_else(|_| "unknown".to_string())
    );

    let supported = device
        .default_input_config()
        .map_err(|e| BackendError::UnsupportedConfig(e.to_string()))?;
    let config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };
    log::debug!(
        "Input config: {} Hz, {} channel(s), {:?}",
        config.sample_rate.0,
        config.channels,
        supported.sample_format()
    );

    match supported.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, format.sample_rate, sink),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, format.sample_rate, sink),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, format.sample_rate, sink),
        other => Err(BackendError::UnsupportedConfig(format!("sample format {:?}", other))),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    target_rate: u32,
    sink: FrameCallback,
) -> Result<cpal::Stream, BackendError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let source_rate = config.sample_rate.0;

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data.iter().map(|&s| <f32 as FromSample<T>>::from_sample_(s)).collect();
                let mono = downmix_to_mono(&samples, channels);
                let mono = resample(&mono, source_rate, target_rate);
                sink(&f32_to_s16le(&mono));
            },
            |err| log::error!("Input stream error: {}", err),
            None,
        )
        .map_err(|e| BackendError::Stream(e.to_string()))
}
