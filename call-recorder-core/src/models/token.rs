use std::fmt;

/// File extension of raw recordings.
pub const RECORDING_EXTENSION: &str = "raw";

/// Identifies one continuous capture run.
///
/// Built from the capture-start time and the call session id; the
/// recording's file name is derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptureSessionToken {
    started_at: i64,
    session_id: String,
}

impl CaptureSessionToken {
    pub fn new(started_at: i64, session_id: impl Into<String>) -> Self {
        Self {
            started_at,
            session_id: session_id.into(),
        }
    }

    /// Epoch seconds at which capture started.
    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// `<epoch-seconds>-<session-id>.raw`, with path separators in the
    /// session id replaced so the name stays inside the recordings directory.
    pub fn file_name(&self) -> String {
        let session: String = self
            .session_id
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        format!("{}-{}.{}", self.started_at, session, RECORDING_EXTENSION)
    }

    /// Recover a token from a recording file name.
    pub fn parse_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(RECORDING_EXTENSION)?.strip_suffix('.')?;
        let (epoch, session) = stem.split_once('-')?;
        if session.is_empty() {
            return None;
        }
        let started_at = epoch.parse::<i64>().ok()?;
        Some(Self::new(started_at, session))
    }
}

impl fmt::Display for CaptureSessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.started_at, self.session_id)
    }
}

/// Identifies one playback invocation.
///
/// `version` is what cancellation compares against; the timestamp and
/// file name are carried for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaybackRequestToken {
    version: u64,
    started_at_ms: i64,
    file_name: String,
}

impl PlaybackRequestToken {
    pub fn new(version: u64, started_at_ms: i64, file_name: impl Into<String>) -> Self {
        Self {
            version,
            started_at_ms,
            file_name: file_name.into(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for PlaybackRequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}#{}", self.started_at_ms, self.file_name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_format() {
        let token = CaptureSessionToken::new(1000, "s1");
        assert_eq!(token.file_name(), "1000-s1.raw");
    }

    #[test]
    fn session_id_separators_are_replaced() {
        let token = CaptureSessionToken::new(5, "a/b\\c");
        assert_eq!(token.file_name(), "5-a_b_c.raw");
    }

    #[test]
    fn parse_keeps_dashes_in_session_id() {
        let token = CaptureSessionToken::parse_file_name("1700000000-2_MX4-abc.raw").unwrap();
        assert_eq!(token.started_at(), 1700000000);
        assert_eq!(token.session_id(), "2_MX4-abc");
    }

    #[test]
    fn parse_rejects_foreign_names() {
        assert!(CaptureSessionToken::parse_file_name("notes.txt").is_none());
        assert!(CaptureSessionToken::parse_file_name("abc-s1.raw").is_none());
        assert!(CaptureSessionToken::parse_file_name("1000-.raw").is_none());
        assert!(CaptureSessionToken::parse_file_name("1000-s1.metadata.json").is_none());
    }

    #[test]
    fn playback_token_display() {
        let token = PlaybackRequestToken::new(3, 1_700_000_000_123, "1000-s1.raw");
        assert_eq!(token.to_string(), "1700000000123-1000-s1.raw#3");
    }
}
