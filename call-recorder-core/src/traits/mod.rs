pub mod audio_device;
pub mod capturer;
pub mod clock;
pub mod output;
pub mod recorder_delegate;
pub mod renderer;
