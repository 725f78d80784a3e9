//! Event multiplexer: many lifecycle channels in, one snapshot stream out.
//!
//! For one playback attempt the multiplexer registers a listener per wired
//! event. Each firing applies that event's rule to the single [`Snapshot`]
//! it owns and publishes a copy of the result to its [`SnapshotSink`],
//! synchronously inside the resource's delivery of the event.
//!
//! ```text
//! resource ──"timeupdate"──▶ listener ──▶ rules::apply ──▶ sink.publish(snapshot)
//!          ──"ended"───────▶ listener ──▶ rules::apply ──▶ sink.publish(snapshot)
//!                                                      └─▶ sink.terminate(Ended)
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use media_events::{EventSource, EventTable, ListenerHandle, MediaEvent, MediaResource, Result};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::rules::{self, MutationRules, Terminal};
use crate::snapshot::Snapshot;

/// Downstream side of a multiplexer.
///
/// Both methods are called without any multiplexer lock held, so
/// implementations may call back into the multiplexer (e.g. `detach`).
pub trait SnapshotSink: Send + Sync {
    /// Receive the full state after a mutation
    fn publish(&self, snapshot: Snapshot);

    /// The resource signalled the end of playback
    fn terminate(&self, terminal: Terminal);
}

/// State reachable from the listeners registered on the resource.
struct Dispatcher {
    resource: Arc<dyn MediaResource>,
    rules: MutationRules,
    snapshot: Mutex<Snapshot>,
    sink: Arc<dyn SnapshotSink>,
    detached: AtomicBool,
    publications: AtomicU64,
}

impl Dispatcher {
    fn dispatch(&self, event: MediaEvent) {
        if self.detached.load(Ordering::Acquire) {
            trace!("Ignoring '{}' delivered after detach", event);
            return;
        }

        // Resource reads happen before locking: a getter may raise an event
        let (update, effect) = rules::observe(event, self.resource.as_ref(), &self.rules);
        let published = {
            let mut snapshot = self.snapshot.lock();
            update.apply_to(&mut snapshot);
            effect.publish.then(|| snapshot.clone())
        };

        if let Some(snapshot) = published {
            let sequence = self.publications.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(
                "Publishing snapshot #{} after '{}' (t={:.3}s)",
                sequence,
                event,
                snapshot.current_time
            );
            self.sink.publish(snapshot);
        }

        if effect.start_playback {
            if let Err(e) = self.resource.play() {
                warn!("Resource refused to start playback: {}", e);
            }
        }

        if let Some(terminal) = effect.terminal {
            debug!("'{}' ends the stream ({:?})", event, terminal);
            self.sink.terminate(terminal);
        }
    }
}

/// Owner of one session's snapshot and listener registrations.
///
/// Single-use: once detached, it never registers again. Dropping it
/// detaches.
pub struct Multiplexer {
    dispatcher: Arc<Dispatcher>,
    registrations: Mutex<EventTable<ListenerHandle>>,
}

impl Multiplexer {
    /// Register a listener for every event in `rules.events`
    ///
    /// The snapshot starts from [`Snapshot::initial`] with `src` recorded.
    ///
    /// # Errors
    ///
    /// Returns the resource's registration error. Listeners registered
    /// before the failure are released before returning.
    pub fn attach(
        resource: Arc<dyn MediaResource>,
        src: impl Into<String>,
        rules: MutationRules,
        sink: Arc<dyn SnapshotSink>,
    ) -> Result<Self> {
        let snapshot = Snapshot::initial(src, resource.as_ref());
        let channels = EventSource::bind(Arc::clone(&resource), &rules.events);

        let dispatcher = Arc::new(Dispatcher {
            resource,
            rules,
            snapshot: Mutex::new(snapshot),
            sink,
            detached: AtomicBool::new(false),
            publications: AtomicU64::new(0),
        });

        let mut registrations = EventTable::new();
        for channel in channels.iter() {
            let event = channel.event();
            let weak: Weak<Dispatcher> = Arc::downgrade(&dispatcher);

            let registered = channel.subscribe(move || {
                if let Some(dispatcher) = weak.upgrade() {
                    dispatcher.dispatch(event);
                }
            });

            match registered {
                Ok(handle) => {
                    registrations.insert(event, handle);
                }
                Err(e) => {
                    warn!(
                        "Listener registration failed for '{}', releasing {} registered listener(s)",
                        event,
                        registrations.len()
                    );
                    dispatcher.detached.store(true, Ordering::Release);
                    for (_, handle) in registrations.drain() {
                        handle.release();
                    }
                    return Err(e);
                }
            }
        }

        debug!(
            "Multiplexer attached {} listener(s) for '{}'",
            registrations.len(),
            dispatcher.snapshot.lock().src
        );

        Ok(Self {
            dispatcher,
            registrations: Mutex::new(registrations),
        })
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Snapshot {
        self.dispatcher.snapshot.lock().clone()
    }

    /// Events that currently have a registered listener
    pub fn registered_events(&self) -> Vec<MediaEvent> {
        self.registrations.lock().events()
    }

    /// Number of snapshots published so far
    pub fn publications(&self) -> u64 {
        self.dispatcher.publications.load(Ordering::Relaxed)
    }

    /// Whether the multiplexer has been detached
    pub fn is_detached(&self) -> bool {
        self.dispatcher.detached.load(Ordering::Acquire)
    }

    /// Release every listener registration
    ///
    /// Returns `true` only for the call that detached. Events already in
    /// flight when this runs are ignored.
    pub fn detach(&self) -> bool {
        if self.dispatcher.detached.swap(true, Ordering::AcqRel) {
            return false;
        }

        let handles = std::mem::take(&mut *self.registrations.lock()).drain();
        let released = handles.iter().filter(|(_, handle)| handle.release()).count();
        debug!("Multiplexer detached, released {} listener(s)", released);
        true
    }
}

impl Drop for Multiplexer {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Multiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Multiplexer")
            .field("registered_events", &self.registered_events())
            .field("publications", &self.publications())
            .field("detached", &self.is_detached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_events::ScriptedResource;

    #[derive(Default)]
    struct Recorder {
        snapshots: Mutex<Vec<Snapshot>>,
        terminals: Mutex<Vec<Terminal>>,
    }

    impl SnapshotSink for Recorder {
        fn publish(&self, snapshot: Snapshot) {
            self.snapshots.lock().push(snapshot);
        }

        fn terminate(&self, terminal: Terminal) {
            self.terminals.lock().push(terminal);
        }
    }

    fn attach(resource: &Arc<ScriptedResource>, rules: MutationRules) -> (Multiplexer, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let multiplexer =
            Multiplexer::attach(resource.clone(), "track.mp3", rules, recorder.clone()).unwrap();
        (multiplexer, recorder)
    }

    #[test]
    fn test_attach_registers_every_wired_event() {
        let resource = Arc::new(ScriptedResource::new());
        let (multiplexer, _recorder) = attach(&resource, MutationRules::default());

        assert_eq!(resource.listener_count(), MediaEvent::all().len());
        assert_eq!(multiplexer.registered_events(), MediaEvent::all());
        assert_eq!(multiplexer.snapshot().src, "track.mp3");
    }

    #[test]
    fn test_events_publish_in_delivery_order() {
        let resource = Arc::new(ScriptedResource::new());
        let (multiplexer, recorder) = attach(&resource, MutationRules::default());

        resource.emit(MediaEvent::Play);
        resource.tick(0.5);
        resource.set_volume(0.2);
        resource.emit(MediaEvent::VolumeChange);

        let snapshots = recorder.snapshots.lock().clone();
        assert_eq!(snapshots.len(), 3);
        assert!(snapshots[0].playing);
        assert_eq!(snapshots[0].current_time, 0.0);
        assert_eq!(snapshots[1].current_time, 0.5);
        assert_eq!(snapshots[1].volume, 1.0);
        assert_eq!(snapshots[2].volume, 0.2);
        assert_eq!(multiplexer.publications(), 3);
        assert_eq!(multiplexer.snapshot(), snapshots[2]);
    }

    #[test]
    fn test_published_snapshots_are_copies() {
        let resource = Arc::new(ScriptedResource::new());
        let (multiplexer, recorder) = attach(&resource, MutationRules::default());

        resource.tick(1.0);
        resource.tick(2.0);

        let snapshots = recorder.snapshots.lock().clone();
        assert_eq!(snapshots[0].current_time, 1.0);
        assert_eq!(multiplexer.snapshot().current_time, 2.0);
    }

    #[test]
    fn test_can_play_triggers_playback() {
        let resource = Arc::new(ScriptedResource::new());
        let (_multiplexer, recorder) = attach(&resource, MutationRules::default());

        resource.emit(MediaEvent::CanPlay);

        assert_eq!(resource.play_calls(), 1);
        assert!(!resource.paused());
        assert!(recorder.snapshots.lock().is_empty());
    }

    #[test]
    fn test_rejected_playback_is_not_fatal() {
        let resource = Arc::new(ScriptedResource::new());
        resource.reject_play("autoplay blocked");
        let (multiplexer, recorder) = attach(&resource, MutationRules::default());

        resource.emit(MediaEvent::CanPlay);
        resource.tick(0.1);

        assert!(!multiplexer.is_detached());
        assert_eq!(recorder.snapshots.lock().len(), 1);
        assert!(recorder.terminals.lock().is_empty());
    }

    #[test]
    fn test_terminal_events_publish_then_terminate() {
        let resource = Arc::new(ScriptedResource::new());
        let (_multiplexer, recorder) = attach(&resource, MutationRules::default());

        resource.emit(MediaEvent::Ended);

        let snapshots = recorder.snapshots.lock().clone();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].ended);
        assert_eq!(*recorder.terminals.lock(), vec![Terminal::Ended]);
    }

    #[test]
    fn test_detach_is_idempotent_and_silences_listeners() {
        let resource = Arc::new(ScriptedResource::new());
        let (multiplexer, recorder) = attach(&resource, MutationRules::default());

        assert!(multiplexer.detach());
        assert!(!multiplexer.detach());
        assert!(multiplexer.is_detached());
        assert_eq!(resource.listener_count(), 0);
        assert!(multiplexer.registered_events().is_empty());

        resource.tick(3.0);
        assert!(recorder.snapshots.lock().is_empty());
    }

    #[test]
    fn test_drop_detaches() {
        let resource = Arc::new(ScriptedResource::new());
        let (multiplexer, _recorder) = attach(&resource, MutationRules::default());
        drop(multiplexer);
        assert_eq!(resource.listener_count(), 0);
    }

    #[test]
    fn test_partial_registration_is_rolled_back() {
        let resource = Arc::new(ScriptedResource::new());
        resource.fail_registration_for(MediaEvent::TimeUpdate);
        let recorder = Arc::new(Recorder::default());

        let result = Multiplexer::attach(
            resource.clone(),
            "track.mp3",
            MutationRules::default(),
            recorder.clone(),
        );

        assert!(result.is_err());
        assert_eq!(resource.listener_count(), 0);
    }

    /// Host whose playhead getter raises "volumechange" once
    struct ReentrantResource {
        inner: ScriptedResource,
        raised: AtomicBool,
    }

    impl MediaResource for ReentrantResource {
        fn set_source(&self, uri: &str) {
            self.inner.set_source(uri)
        }

        fn play(&self) -> Result<()> {
            self.inner.play()
        }

        fn pause(&self) {
            self.inner.pause()
        }

        fn current_time(&self) -> f64 {
            if !self.raised.swap(true, Ordering::AcqRel) {
                self.inner.emit(MediaEvent::VolumeChange);
            }
            self.inner.current_time()
        }

        fn set_current_time(&self, seconds: f64) {
            self.inner.set_current_time(seconds)
        }

        fn duration(&self) -> Option<f64> {
            self.inner.duration()
        }

        fn volume(&self) -> f64 {
            self.inner.volume()
        }

        fn playback_rate(&self) -> f64 {
            self.inner.playback_rate()
        }

        fn buffered_end(&self) -> f64 {
            self.inner.buffered_end()
        }

        fn paused(&self) -> bool {
            self.inner.paused()
        }

        fn error(&self) -> Option<media_events::ErrorInfo> {
            self.inner.error()
        }

        fn add_listener(
            &self,
            event: MediaEvent,
            listener: media_events::Listener,
        ) -> Result<media_events::ListenerId> {
            self.inner.add_listener(event, listener)
        }

        fn remove_listener(&self, id: media_events::ListenerId) -> bool {
            self.inner.remove_listener(id)
        }
    }

    #[test]
    fn test_getter_may_raise_events_during_dispatch() {
        let resource = Arc::new(ReentrantResource {
            inner: ScriptedResource::new(),
            raised: AtomicBool::new(false),
        });
        let recorder = Arc::new(Recorder::default());
        let multiplexer = Multiplexer::attach(
            resource.clone(),
            "track.mp3",
            MutationRules::default(),
            recorder.clone(),
        )
        .unwrap();

        resource.inner.set_volume(0.6);
        resource.inner.tick(1.5);

        let snapshots = recorder.snapshots.lock().clone();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].volume, 0.6);
        assert_eq!(snapshots[0].current_time, 0.0);
        assert_eq!(snapshots[1].volume, 0.6);
        assert_eq!(snapshots[1].current_time, 1.5);
        assert_eq!(multiplexer.publications(), 2);
    }

    #[test]
    fn test_only_configured_events_are_wired() {
        let resource = Arc::new(ScriptedResource::new());
        let rules = MutationRules {
            events: vec![MediaEvent::TimeUpdate, MediaEvent::Ended, MediaEvent::Error],
            ..Default::default()
        };
        let (_multiplexer, recorder) = attach(&resource, rules);

        assert_eq!(resource.listener_count(), 3);
        assert_eq!(resource.emit(MediaEvent::Play), 0);
        assert!(recorder.snapshots.lock().is_empty());
    }
}
