//! Error types for the mediaflow crate.

use media_events::ResourceError;

use crate::types::SessionId;

/// Errors surfaced by playback sessions.
///
/// Media errors reported by the resource are not in here: they arrive as
/// `Snapshot::error` and end the stream normally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// A listener could not be registered during setup
    #[error("Session setup failed: {0}")]
    Registration(#[from] ResourceError),

    /// Another session holds the resource
    #[error("Resource is busy with {0}")]
    ResourceBusy(SessionId),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use media_events::MediaEvent;

    #[test]
    fn test_error_display() {
        let error = SessionError::from(ResourceError::ListenerRegistration {
            event: MediaEvent::TimeUpdate,
            reason: "detached element".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Session setup failed: Failed to register listener for 'timeupdate': detached element"
        );

        let error = SessionError::ResourceBusy(SessionId::from_raw(7));
        assert_eq!(error.to_string(), "Resource is busy with session-7");

        let error = SessionError::Configuration("no events".to_string());
        assert_eq!(error.to_string(), "Configuration error: no events");
    }
}
