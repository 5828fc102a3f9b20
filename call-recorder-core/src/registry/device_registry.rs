use std::fmt;
use std::sync::Arc;

use crate::capture::device::PlaceholderDevice;
use crate::traits::audio_device::AudioDevice;

/// Device reference shared between the registry and the call engine.
pub type SharedDevice = Arc<dyn AudioDevice>;

/// Holder of the one audio device the call engine uses.
///
/// Owned by the session-setup (control) thread. Mutation takes `&mut self`,
/// so any cross-thread use has to go through a lock the caller chooses and
/// installation can never race.
#[derive(Default)]
pub struct AudioDeviceRegistry {
    device: Option<SharedDevice>,
}

impl AudioDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the platform's default no-op device.
    pub fn with_placeholder() -> Self {
        Self {
            device: Some(Arc::new(PlaceholderDevice::default())),
        }
    }

    pub fn get(&self) -> Option<SharedDevice> {
        self.device.clone()
    }

    /// Replace the held device unconditionally.
    pub fn set(&mut self, device: SharedDevice) {
        self.device = Some(device);
    }

    /// Remove and return the held device.
    pub fn clear(&mut self) -> Option<SharedDevice> {
        self.device.take()
    }

    /// True when no device is held or the held one is a placeholder.
    pub fn needs_device(&self) -> bool {
        self.device.as_ref().map_or(true, |d| d.is_placeholder())
    }

    /// Install the device built by `make` unless a real one is already
    /// active. Returns the active device and whether `make` ran.
    pub fn install_if_needed<F>(&mut self, make: F) -> (SharedDevice, bool)
    where
        F: FnOnce() -> SharedDevice,
    {
        if let Some(ref existing) = self.device {
            if !existing.is_placeholder() {
                return (Arc::clone(existing), false);
            }
        }
        let device = make();
        self.set(Arc::clone(&device));
        (device, true)
    }
}

impl fmt::Debug for AudioDeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioDeviceRegistry")
            .field("device", &self.device.as_ref().map(|d| d.name()))
            .finish()
    }
}
