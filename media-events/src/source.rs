//! Event source adapter: one lazily wired channel per named event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::event::{EventTable, MediaEvent};
use crate::resource::{Listener, MediaResource};
use crate::types::ListenerId;

/// Adapter binding a media resource to per-event notification channels.
///
/// The adapter keeps no state besides the resource binding. It never
/// registers anything on its own: registration happens when a channel is
/// subscribed, and the resulting [`ListenerHandle`] owns it.
#[derive(Clone)]
pub struct EventSource {
    resource: Arc<dyn MediaResource>,
}

impl EventSource {
    /// Create an adapter for a resource
    pub fn new(resource: Arc<dyn MediaResource>) -> Self {
        Self { resource }
    }

    /// Build the channel for a single event
    pub fn channel(&self, event: MediaEvent) -> EventChannel {
        EventChannel {
            resource: Arc::clone(&self.resource),
            event,
        }
    }

    /// Build channels for a set of events
    ///
    /// Duplicate events collapse into one channel.
    pub fn bind(resource: Arc<dyn MediaResource>, events: &[MediaEvent]) -> EventChannels {
        let source = Self::new(resource);
        let mut channels = EventTable::new();
        for &event in events {
            channels.insert(event, source.channel(event));
        }
        EventChannels { channels }
    }
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource").finish_non_exhaustive()
    }
}

/// Channels produced by [`EventSource::bind`], keyed by event.
#[derive(Debug)]
pub struct EventChannels {
    channels: EventTable<EventChannel>,
}

impl EventChannels {
    /// Channel for an event, if it was bound
    pub fn get(&self, event: MediaEvent) -> Option<&EventChannel> {
        self.channels.get(event)
    }

    /// Bound channels in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &EventChannel> {
        self.channels.iter().map(|(_, channel)| channel)
    }

    /// Bound events in catalog order
    pub fn events(&self) -> Vec<MediaEvent> {
        self.channels.events()
    }

    /// Number of bound channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if no channel was bound
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Notification channel for one named event of one resource.
///
/// Fires whenever the resource raises the event; if the resource never
/// raises it, the channel never fires.
#[derive(Clone)]
pub struct EventChannel {
    resource: Arc<dyn MediaResource>,
    event: MediaEvent,
}

impl EventChannel {
    /// The event this channel carries
    pub fn event(&self) -> MediaEvent {
        self.event
    }

    /// Register a listener on the resource for this event
    ///
    /// The listener stays registered until the returned handle is released
    /// or dropped.
    pub fn subscribe<F>(&self, listener: F) -> Result<ListenerHandle>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let id = self.resource.add_listener(self.event, listener)?;
        trace!("Registered {} for '{}'", id, self.event);

        Ok(ListenerHandle {
            resource: Arc::clone(&self.resource),
            id,
            event: self.event,
            released: AtomicBool::new(false),
        })
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// Ownership of one listener registration.
///
/// Releasing is idempotent; dropping the handle releases it.
pub struct ListenerHandle {
    resource: Arc<dyn MediaResource>,
    id: ListenerId,
    event: MediaEvent,
    released: AtomicBool,
}

impl ListenerHandle {
    /// The resource-assigned listener ID
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// The event the listener is registered for
    pub fn event(&self) -> MediaEvent {
        self.event
    }

    /// Whether the registration has been released
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Deregister the listener
    ///
    /// Returns `true` only for the call that actually released it.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }

        if !self.resource.remove_listener(self.id) {
            debug!(
                "{} for '{}' was already gone from the resource",
                self.id, self.event
            );
        }
        true
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("released", &self.is_released())
            .finish()
    }
}
