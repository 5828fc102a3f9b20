use crate::models::error::DeviceError;

/// Render (loopback output) half of the audio device capability set.
pub trait Renderer: Send + Sync {
    fn start_render(&self) -> Result<(), DeviceError>;

    fn stop_render(&self) -> Result<(), DeviceError>;

    /// Fill `out` with the next block of output PCM; returns the number of
    /// bytes produced.
    fn render_frame(&self, out: &mut [u8]) -> usize;
}

/// Renderer that produces silence and has no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentRenderer;

impl Renderer for SilentRenderer {
    fn start_render(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn stop_render(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn render_frame(&self, out: &mut [u8]) -> usize {
        out.fill(0);
        out.len()
    }
}
