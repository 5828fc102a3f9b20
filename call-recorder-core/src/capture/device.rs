use std::sync::Arc;

use crate::models::error::DeviceError;
use crate::models::recording::RecordingResult;
use crate::traits::audio_device::AudioDevice;
use crate::traits::capturer::Capturer;
use crate::traits::renderer::{Renderer, SilentRenderer};

use super::adapter::CaptureAdapter;

/// The recording audio device handed to the call engine: a `CaptureAdapter`
/// for the capture half, composed with a renderer for the output half.
pub struct RecordingDevice<R: Renderer = SilentRenderer> {
    name: String,
    capture: Arc<CaptureAdapter>,
    render: R,
}

impl RecordingDevice {
    pub fn new(capture: CaptureAdapter) -> Self {
        Self::with_renderer(capture, SilentRenderer)
    }
}

impl<R: Renderer> RecordingDevice<R> {
    pub fn with_renderer(capture: CaptureAdapter, render: R) -> Self {
        Self {
            name: format!("recorder:{}", capture.token()),
            capture: Arc::new(capture),
            render,
        }
    }

    /// The concrete adapter, for callers that need `frame_sink` or diagnostics.
    pub fn adapter(&self) -> &Arc<CaptureAdapter> {
        &self.capture
    }
}

impl<R: Renderer> AudioDevice for RecordingDevice<R> {
    fn capturer(&self) -> &dyn Capturer {
        self.capture.as_ref()
    }

    fn renderer(&self) -> &dyn Renderer {
        &self.render
    }

    fn is_placeholder(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Capturer of the platform default device: accepts and discards frames.
#[derive(Debug, Default)]
pub struct NullCapturer;

impl Capturer for NullCapturer {
    fn start_capture(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn stop_capture(&self) -> Result<RecordingResult, DeviceError> {
        Err(DeviceError::InvalidState("placeholder device records nothing".into()))
    }

    fn deliver_frame(&self, _frame: &[u8]) {}

    fn is_capturing(&self) -> bool {
        false
    }
}

/// Stand-in for the call platform's built-in device. The session recorder
/// replaces it with a `RecordingDevice` before the next call.
#[derive(Debug, Default)]
pub struct PlaceholderDevice {
    capture: NullCapturer,
    render: SilentRenderer,
}

impl AudioDevice for PlaceholderDevice {
    fn capturer(&self) -> &dyn Capturer {
        &self.capture
    }

    fn renderer(&self) -> &dyn Renderer {
        &self.render
    }

    fn is_placeholder(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "default"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format::PcmFormat;
    use crate::models::token::CaptureSessionToken;

    #[test]
    fn recording_device_composes_halves() {
        let token = CaptureSessionToken::new(1000, "s1");
        let path = std::env::temp_dir().join("call_recorder_device_unused.raw");
        let device = RecordingDevice::new(CaptureAdapter::new(token, path, PcmFormat::RECORDING));

        assert!(!device.is_placeholder());
        assert_eq!(device.name(), "recorder:1000-s1");
        assert!(!device.capturer().is_capturing());

        let mut out = [1u8; 8];
        assert_eq!(device.renderer().render_frame(&mut out), 8);
        assert_eq!(out, [0u8; 8]);
    }

    #[test]
    fn placeholder_records_nothing() {
        let device = PlaceholderDevice::default();
        assert!(device.is_placeholder());
        device.capturer().start_capture().unwrap();
        device.capturer().deliver_frame(&[1, 2, 3]);
        assert!(!device.capturer().is_capturing());
        assert!(matches!(
            device.capturer().stop_capture(),
            Err(DeviceError::InvalidState(_))
        ));
    }
}
