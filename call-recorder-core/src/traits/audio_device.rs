use super::capturer::Capturer;
use super::renderer::Renderer;

/// An audio device as the call engine sees it: a capture half and a render
/// half, composed rather than inherited.
pub trait AudioDevice: Send + Sync {
    fn capturer(&self) -> &dyn Capturer;

    fn renderer(&self) -> &dyn Renderer;

    /// True for the platform's default device, which records nothing and
    /// may be replaced at any time.
    fn is_placeholder(&self) -> bool;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}
