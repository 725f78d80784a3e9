//! The capability set a host media resource must provide.

use std::sync::Arc;

use crate::error::Result;
use crate::event::MediaEvent;
use crate::types::{ErrorInfo, ListenerId};

/// Callback invoked by the resource each time the event it was registered
/// for is raised. Carries no payload: state is read back from the resource.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// A host-provided playable media resource (an audio or video element).
///
/// All methods take `&self`: the resource is shared between the session that
/// drives it and the listeners it calls back into, so implementations use
/// interior mutability.
///
/// # Delivery contract
///
/// Implementations must deliver events in the order they occur, on a single
/// logical execution context, and must not hold internal locks while a
/// listener runs. Listeners may call any method of the resource, including
/// [`remove_listener`](MediaResource::remove_listener) for themselves or for
/// listeners of the same event. A listener removed during a dispatch is not
/// invoked later in that dispatch. Getters may raise events synchronously;
/// consumers read them without holding their own locks.
pub trait MediaResource: Send + Sync {
    /// Point the resource at a new source; an empty string unloads it
    fn set_source(&self, uri: &str);

    /// Ask the resource to start playback
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::PlaybackRejected` if the host refuses (for
    /// example an autoplay policy).
    fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Seek to a position in seconds
    fn set_current_time(&self, seconds: f64);

    /// Media duration in seconds, `None` while unknown
    fn duration(&self) -> Option<f64>;

    /// Volume in `[0, 1]`
    fn volume(&self) -> f64;

    /// Playback rate, 1.0 being normal speed
    fn playback_rate(&self) -> f64;

    /// End of the buffered range in seconds, 0 when nothing is buffered
    fn buffered_end(&self) -> f64;

    /// Whether the resource is paused
    fn paused(&self) -> bool;

    /// The last media error, if any
    fn error(&self) -> Option<ErrorInfo>;

    /// Register a listener for an event
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::ListenerRegistration` if the host cannot
    /// register the listener.
    fn add_listener(&self, event: MediaEvent, listener: Listener) -> Result<ListenerId>;

    /// Deregister a listener, returning whether it was registered
    fn remove_listener(&self, id: ListenerId) -> bool;
}
