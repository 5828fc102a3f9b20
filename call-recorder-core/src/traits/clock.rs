/// Source of wall-clock timestamps for capture and playback tokens.
pub trait Clock: Send + Sync {
    fn now_epoch_secs(&self) -> i64;

    fn now_epoch_millis(&self) -> i64;
}

/// `chrono`-backed UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn now_epoch_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub epoch_secs: i64,
}

impl Clock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.epoch_secs
    }

    fn now_epoch_millis(&self) -> i64 {
        self.epoch_secs * 1000
    }
}
