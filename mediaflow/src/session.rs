//! Playback session: a cold, cancellable snapshot stream over one resource.
//!
//! Nothing happens until [`PlaybackSession::subscribe`] is called. Each call
//! sets up from scratch:
//!
//! 1. claim the resource on its [`ResourceHandle`]
//! 2. attach a [`Multiplexer`] with a fresh snapshot
//! 3. hook into the [`CancellationSignal`]
//! 4. point the resource at the uri
//!
//! and ends with exactly one teardown, whatever triggers it first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use media_state::{Multiplexer, Snapshot, SnapshotSink, Terminal};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::handle::ResourceHandle;
use crate::signal::{CancellationSignal, SignalSubscription};
use crate::stream::SnapshotStream;
use crate::types::{SessionId, TeardownReason};

pub(crate) type Item = Result<Snapshot>;

/// A playback request that starts when subscribed.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    handle: ResourceHandle,
    uri: String,
    config: SessionConfig,
    signal: CancellationSignal,
}

impl PlaybackSession {
    /// Describe a playback of `uri` on the handle's resource
    ///
    /// Does not touch the resource.
    pub fn new(
        handle: ResourceHandle,
        uri: impl Into<String>,
        config: SessionConfig,
        signal: CancellationSignal,
    ) -> Self {
        Self {
            handle,
            uri: uri.into(),
            config,
            signal,
        }
    }

    /// The source this session plays
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The signal that cancels this session
    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    /// Start a new subscription
    ///
    /// Every call is independent: its own snapshot, listeners and teardown.
    /// A listener registration failure is not returned here; the stream
    /// yields it as its only item and ends.
    ///
    /// # Errors
    ///
    /// - `SessionError::Configuration` if the configuration is invalid
    /// - `SessionError::ResourceBusy` if another session holds the resource
    ///   and the busy policy is `Reject`
    pub fn subscribe(&self) -> Result<SnapshotStream> {
        self.config.validate()?;

        let id = SessionId::next();
        let (sender, receiver) = mpsc::unbounded_channel();
        let core = Arc::new(SessionCore::new(id, self.handle.clone(), sender));

        self.handle.claim(id, &core, self.config.busy_policy)?;
        debug!("{} starting for '{}'", id, self.uri);

        let sink: Arc<dyn SnapshotSink> = Arc::new(SessionSink {
            core: Arc::downgrade(&core),
        });
        let resource = Arc::clone(self.handle.resource());

        match Multiplexer::attach(Arc::clone(&resource), self.uri.as_str(), self.config.rules(), sink) {
            Ok(multiplexer) => *core.multiplexer.lock() = Some(multiplexer),
            Err(e) => {
                warn!("{} setup failed: {}", id, e);
                core.fail(SessionError::from(e));
                return Ok(SnapshotStream::new(core, receiver));
            }
        }

        let weak = Arc::downgrade(&core);
        let subscription = self.signal.subscribe(move || {
            if let Some(core) = weak.upgrade() {
                core.teardown(TeardownReason::Cancelled);
            }
        });
        core.keep_signal_subscription(subscription);

        // A signal that already fired cancelled the session above
        if !core.is_torn_down() {
            resource.set_source(&self.uri);
        }

        Ok(SnapshotStream::new(core, receiver))
    }
}

/// Shared state of one subscription.
pub(crate) struct SessionCore {
    id: SessionId,
    handle: ResourceHandle,
    torn_down: AtomicBool,
    reason: Mutex<Option<TeardownReason>>,
    multiplexer: Mutex<Option<Multiplexer>>,
    signal_subscription: Mutex<Option<SignalSubscription>>,
    sender: Mutex<Option<mpsc::UnboundedSender<Item>>>,
}

impl SessionCore {
    fn new(id: SessionId, handle: ResourceHandle, sender: mpsc::UnboundedSender<Item>) -> Self {
        Self {
            id,
            handle,
            torn_down: AtomicBool::new(false),
            reason: Mutex::new(None),
            multiplexer: Mutex::new(None),
            signal_subscription: Mutex::new(None),
            sender: Mutex::new(Some(sender)),
        }
    }

    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    pub(crate) fn reason(&self) -> Option<TeardownReason> {
        *self.reason.lock()
    }

    fn keep_signal_subscription(&self, subscription: SignalSubscription) {
        if self.is_torn_down() {
            return;
        }
        *self.signal_subscription.lock() = Some(subscription);
    }

    fn publish(&self, item: Item) {
        if self.is_torn_down() {
            trace!("{} dropping publication after teardown", self.id);
            return;
        }
        if let Some(sender) = self.sender.lock().as_ref() {
            // A closed receiver means the stream is being dropped
            let _ = sender.send(item);
        }
    }

    fn fail(&self, error: SessionError) {
        self.publish(Err(error));
        self.teardown(TeardownReason::SetupFailed);
    }

    /// Release everything the session holds
    ///
    /// Only the first call does anything; it returns `true`.
    pub(crate) fn teardown(&self, reason: TeardownReason) -> bool {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return false;
        }
        *self.reason.lock() = Some(reason);
        debug!("{} tearing down ({})", self.id, reason);

        let resource = self.handle.resource();
        resource.pause();
        resource.set_source("");

        let multiplexer = self.multiplexer.lock().take();
        if let Some(multiplexer) = multiplexer {
            multiplexer.detach();
        }

        let subscription = self.signal_subscription.lock().take();
        drop(subscription);

        self.handle.release(self.id);

        // Closing the channel ends the stream once buffered items are read
        self.sender.lock().take();
        true
    }
}

impl std::fmt::Debug for SessionCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCore")
            .field("id", &self.id)
            .field("torn_down", &self.is_torn_down())
            .field("reason", &self.reason())
            .finish()
    }
}

/// Multiplexer output routed into the session.
struct SessionSink {
    core: Weak<SessionCore>,
}

impl SnapshotSink for SessionSink {
    fn publish(&self, snapshot: Snapshot) {
        if let Some(core) = self.core.upgrade() {
            core.publish(Ok(snapshot));
        }
    }

    fn terminate(&self, terminal: Terminal) {
        if let Some(core) = self.core.upgrade() {
            core.teardown(terminal.into());
        }
    }
}
