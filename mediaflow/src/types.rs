//! Session identifiers and teardown reasons.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use media_state::Terminal;
use serde::{Deserialize, Serialize};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one subscription, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Why a session was torn down.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TeardownReason {
    /// The consumer closed or dropped the stream
    Unsubscribed,
    /// The resource played to the end
    Ended,
    /// The resource reported a media error
    Errored,
    /// The cancellation signal fired
    Cancelled,
    /// A newer session took over the resource
    Replaced,
    /// Listener registration failed during setup
    SetupFailed,
}

impl TeardownReason {
    /// Playback reached a natural end (finished or failed)
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Errored)
    }
}

impl From<Terminal> for TeardownReason {
    fn from(terminal: Terminal) -> Self {
        match terminal {
            Terminal::Ended => Self::Ended,
            Terminal::Errored => Self::Errored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
        assert!(b > a);
        assert_eq!(SessionId::from_raw(3).to_string(), "session-3");
    }

    #[test]
    fn test_teardown_reason_names() {
        assert_eq!(TeardownReason::SetupFailed.to_string(), "setup_failed");
        assert_eq!(TeardownReason::Cancelled.to_string(), "cancelled");
        assert_eq!(
            serde_json::to_string(&TeardownReason::Unsubscribed).unwrap(),
            "\"unsubscribed\""
        );
    }

    #[test]
    fn test_terminal_conversion() {
        assert_eq!(TeardownReason::from(Terminal::Ended), TeardownReason::Ended);
        assert_eq!(TeardownReason::from(Terminal::Errored), TeardownReason::Errored);
        assert!(TeardownReason::Ended.is_terminal());
        assert!(!TeardownReason::Cancelled.is_terminal());
    }
}
