//! In-memory media resource driven by explicit event emission.
//!
//! `ScriptedResource` plays the part of the host's media element in tests and
//! demos: state is set directly, events are raised with [`ScriptedResource::emit`],
//! and every call the session makes is recorded for later assertions.
//!
//! ```rust,ignore
//! let resource = Arc::new(ScriptedResource::new());
//! resource.set_duration(Some(30.0));
//! resource.emit(MediaEvent::DurationChange);
//! resource.tick(1.5); // current_time = 1.5, then "timeupdate"
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{ResourceError, Result};
use crate::event::MediaEvent;
use crate::resource::{Listener, MediaResource};
use crate::types::{ErrorInfo, ListenerId};

#[derive(Debug)]
struct ScriptedState {
    source: String,
    source_history: Vec<String>,
    paused: bool,
    current_time: f64,
    duration: Option<f64>,
    volume: f64,
    playback_rate: f64,
    buffered_end: f64,
    error: Option<ErrorInfo>,
    play_calls: usize,
    pause_calls: usize,
    reject_play: Option<String>,
    failing_events: Vec<MediaEvent>,
}

impl Default for ScriptedState {
    fn default() -> Self {
        Self {
            source: String::new(),
            source_history: Vec::new(),
            paused: true,
            current_time: 0.0,
            duration: None,
            volume: 1.0,
            playback_rate: 1.0,
            buffered_end: 0.0,
            error: None,
            play_calls: 0,
            pause_calls: 0,
            reject_play: None,
            failing_events: Vec::new(),
        }
    }
}

struct Registered {
    id: ListenerId,
    event: MediaEvent,
    listener: Listener,
}

/// Scriptable [`MediaResource`] with DOM-style synchronous dispatch.
pub struct ScriptedResource {
    state: Mutex<ScriptedState>,
    listeners: Mutex<Vec<Registered>>,
    next_listener_id: AtomicU64,
}

impl ScriptedResource {
    /// Create a paused, empty resource at volume 1.0 and normal rate
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptedState::default()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        }
    }

    // ------------------------------------------------------------------
    // Event emission
    // ------------------------------------------------------------------

    /// Raise an event, invoking its listeners in registration order
    ///
    /// Returns how many listeners ran. Listeners removed by an earlier
    /// listener of the same dispatch are skipped.
    pub fn emit(&self, event: MediaEvent) -> usize {
        let targets: Vec<(ListenerId, Listener)> = self
            .listeners
            .lock()
            .iter()
            .filter(|registered| registered.event == event)
            .map(|registered| (registered.id, Arc::clone(&registered.listener)))
            .collect();

        let mut delivered = 0;
        for (id, listener) in targets {
            if !self.is_registered(id) {
                continue;
            }
            listener();
            delivered += 1;
        }

        trace!("Scripted '{}' reached {} listener(s)", event, delivered);
        delivered
    }

    /// Move the playhead and raise "timeupdate"
    pub fn tick(&self, current_time: f64) -> usize {
        self.state.lock().current_time = current_time;
        self.emit(MediaEvent::TimeUpdate)
    }

    /// Move the playhead with "seeking" / "seeked" around it
    pub fn seek(&self, current_time: f64) -> usize {
        let mut delivered = self.emit(MediaEvent::Seeking);
        self.state.lock().current_time = current_time;
        delivered += self.emit(MediaEvent::Seeked);
        delivered
    }

    /// Record a media error and raise "error"
    pub fn fail(&self, error: ErrorInfo) -> usize {
        self.state.lock().error = Some(error);
        self.emit(MediaEvent::Error)
    }

    // ------------------------------------------------------------------
    // State setters
    // ------------------------------------------------------------------

    /// Set the duration without raising an event
    pub fn set_duration(&self, duration: Option<f64>) {
        self.state.lock().duration = duration;
    }

    /// Set the volume without raising an event
    pub fn set_volume(&self, volume: f64) {
        self.state.lock().volume = volume;
    }

    /// Set the playback rate without raising an event
    pub fn set_playback_rate(&self, rate: f64) {
        self.state.lock().playback_rate = rate;
    }

    /// Set the end of the buffered range without raising an event
    pub fn set_buffered_end(&self, buffered_end: f64) {
        self.state.lock().buffered_end = buffered_end;
    }

    /// Set the paused flag without counting a pause call
    pub fn set_paused(&self, paused: bool) {
        self.state.lock().paused = paused;
    }

    /// Set or clear the error attribute without raising an event
    pub fn set_error(&self, error: Option<ErrorInfo>) {
        self.state.lock().error = error;
    }

    /// Make every subsequent `play()` fail with the given reason
    pub fn reject_play(&self, reason: impl Into<String>) {
        self.state.lock().reject_play = Some(reason.into());
    }

    /// Make listener registration for an event fail
    pub fn fail_registration_for(&self, event: MediaEvent) {
        self.state.lock().failing_events.push(event);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The current source
    pub fn source(&self) -> String {
        self.state.lock().source.clone()
    }

    /// Every value passed to `set_source`, in order
    pub fn source_history(&self) -> Vec<String> {
        self.state.lock().source_history.clone()
    }

    /// Number of `play()` calls, including rejected ones
    pub fn play_calls(&self) -> usize {
        self.state.lock().play_calls
    }

    /// Number of `pause()` calls
    pub fn pause_calls(&self) -> usize {
        self.state.lock().pause_calls
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Number of listeners registered for one event
    pub fn listener_count_for(&self, event: MediaEvent) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|registered| registered.event == event)
            .count()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .iter()
            .any(|registered| registered.id == id)
    }
}

impl Default for ScriptedResource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedResource")
            .field("state", &*self.state.lock())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl MediaResource for ScriptedResource {
    fn set_source(&self, uri: &str) {
        let mut state = self.state.lock();
        state.source = uri.to_string();
        state.source_history.push(uri.to_string());
        state.current_time = 0.0;
        state.error = None;
    }

    fn play(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.play_calls += 1;
        if let Some(reason) = &state.reject_play {
            return Err(ResourceError::PlaybackRejected(reason.clone()));
        }
        state.paused = false;
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        state.pause_calls += 1;
        state.paused = true;
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.lock().current_time = seconds;
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().playback_rate
    }

    fn buffered_end(&self) -> f64 {
        self.state.lock().buffered_end
    }

    fn paused(&self) -> bool {
        self.state.lock().paused
    }

    fn error(&self) -> Option<ErrorInfo> {
        self.state.lock().error.clone()
    }

    fn add_listener(&self, event: MediaEvent, listener: Listener) -> Result<ListenerId> {
        if self.state.lock().failing_events.contains(&event) {
            return Err(ResourceError::ListenerRegistration {
                event,
                reason: "scripted registration failure".to_string(),
            });
        }

        let id = ListenerId::new(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Registered {
            id,
            event,
            listener,
        });
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|registered| registered.id != id);
        listeners.len() != before
    }
}
