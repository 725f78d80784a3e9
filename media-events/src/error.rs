//! Error types for the media-events crate.

use crate::event::MediaEvent;

/// Errors raised by a media resource while wiring or driving playback.
///
/// Media failures reported by the resource itself (decode errors, network
/// failures) are not errors here; they travel as [`crate::ErrorInfo`] data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    /// The resource refused to register a listener
    #[error("Failed to register listener for '{event}': {reason}")]
    ListenerRegistration {
        /// The event the listener was meant for
        event: MediaEvent,
        /// Host-provided reason
        reason: String,
    },

    /// The resource rejected a request to start playback
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// The resource is gone or no longer usable
    #[error("Resource unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for Results using ResourceError.
pub type Result<T> = std::result::Result<T, ResourceError>;
