//! # media-events
//!
//! The lowest layer of mediaflow: a closed catalog of media lifecycle events,
//! the capability set required from a host media resource, and the event
//! source adapter that turns each named event into an independently
//! subscribable channel.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use media_events::{EventSource, MediaEvent, MediaResource};
//!
//! let channels = EventSource::bind(resource, &[MediaEvent::TimeUpdate]);
//! let handle = channels
//!     .get(MediaEvent::TimeUpdate)
//!     .expect("bound above")
//!     .subscribe(|| println!("time moved"))?;
//!
//! // Listener stays registered until released (or dropped)
//! handle.release();
//! ```
//!
//! Nothing is registered on the resource until a channel is subscribed, and
//! every registration is owned by the returned [`ListenerHandle`].

mod error;
mod event;
mod resource;
mod source;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod scripted;

pub use error::{ResourceError, Result};
pub use event::{EventTable, MediaEvent};
pub use resource::{Listener, MediaResource};
pub use source::{EventChannel, EventChannels, EventSource, ListenerHandle};
pub use types::{ErrorInfo, ListenerId, MediaErrorCode};

#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedResource;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ErrorInfo, EventSource, EventTable, ListenerHandle, MediaErrorCode, MediaEvent,
        MediaResource, ResourceError,
    };
}
