/// Capture adapter state machine.
///
/// ```text
/// idle → capturing → stopped
///            ↓          ↑
///         dropping ─────┘
/// ```
///
/// `Dropping` is entered on the first failed append; frames keep arriving
/// but are discarded until the call ends. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Dropping,
    Stopped,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// True while the call engine is expected to deliver frames.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Capturing | Self::Dropping)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Counters for debugging a capture run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub frames_delivered: u64,
    pub frames_written: u64,
    pub frames_dropped: u64,
    pub bytes_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states() {
        assert!(!CaptureState::Idle.is_active());
        assert!(CaptureState::Capturing.is_active());
        assert!(CaptureState::Dropping.is_active());
        assert!(!CaptureState::Stopped.is_active());
        assert!(CaptureState::Stopped.is_terminal());
        assert!(CaptureState::Idle.is_idle());
    }
}
