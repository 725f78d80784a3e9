//! The `play` / `stop` surface over one media resource.

use std::sync::Arc;

use media_events::MediaResource;
use parking_lot::Mutex;
use tracing::info;

use crate::config::{SessionConfig, SignalScope};
use crate::error::Result;
use crate::handle::ResourceHandle;
use crate::session::PlaybackSession;
use crate::signal::CancellationSignal;
use crate::types::SessionId;

/// Starts playback sessions on a resource and stops them on demand.
///
/// ```rust,ignore
/// let controller = AudioController::new(resource);
/// let mut stream = controller.play("track.mp3").subscribe()?;
///
/// // Later, from anywhere holding the controller
/// controller.stop();
/// assert!(stream.is_terminated());
/// ```
pub struct AudioController {
    handle: ResourceHandle,
    config: SessionConfig,
    signal: Mutex<CancellationSignal>,
}

impl AudioController {
    /// Create a controller with the default configuration
    ///
    /// Controllers built over the same resource share its claim: only one of
    /// them can have an active session at a time.
    pub fn new(resource: Arc<dyn MediaResource>) -> Self {
        Self {
            handle: ResourceHandle::new(resource),
            config: SessionConfig::default(),
            signal: Mutex::new(CancellationSignal::new()),
        }
    }

    /// Create a controller with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` if the configuration is invalid.
    pub fn with_config(resource: Arc<dyn MediaResource>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            handle: ResourceHandle::new(resource),
            config,
            signal: Mutex::new(CancellationSignal::new()),
        })
    }

    /// Describe a playback of `uri`, bound to the current signal
    ///
    /// The returned session is cold; nothing plays until it is subscribed.
    pub fn play(&self, uri: impl Into<String>) -> PlaybackSession {
        PlaybackSession::new(self.handle.clone(), uri, self.config.clone(), self.signal())
    }

    /// Cancel every session bound to the current signal
    ///
    /// Returns once all of them are torn down, with the number of sessions
    /// notified.
    pub fn stop(&self) -> usize {
        let signal = {
            let mut current = self.signal.lock();
            match self.config.signal_scope {
                SignalScope::PerStop => std::mem::take(&mut *current),
                SignalScope::Lifetime => current.clone(),
            }
        };

        let cancelled = signal.fire();
        info!("Stop requested, cancelled {} session(s)", cancelled);
        cancelled
    }

    /// The signal new sessions are bound to
    pub fn signal(&self) -> CancellationSignal {
        self.signal.lock().clone()
    }

    /// Whether a session currently holds the resource
    pub fn is_busy(&self) -> bool {
        self.handle.is_busy()
    }

    /// The session currently holding the resource
    pub fn active_session(&self) -> Option<SessionId> {
        self.handle.active_session()
    }

    /// The controller's configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The handle sessions of this controller share
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

impl std::fmt::Debug for AudioController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioController")
            .field("handle", &self.handle)
            .field("config", &self.config)
            .field("signal", &*self.signal.lock())
            .finish()
    }
}
