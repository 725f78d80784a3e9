//! Per-event mutation rules applied to a [`Snapshot`].

use media_events::{ErrorInfo, MediaEvent, MediaResource};
use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// Which events the multiplexer wires and how the optional rows behave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRules {
    /// Events to register on the resource
    pub events: Vec<MediaEvent>,
    /// Call `play()` on the resource when it reports "canplay"
    pub autoplay: bool,
    /// Publish a snapshot for events that mutate nothing
    pub publish_passive_events: bool,
    /// Let "progress" refresh `buffered`
    pub buffered_on_progress: bool,
}

impl Default for MutationRules {
    fn default() -> Self {
        Self {
            events: MediaEvent::all(),
            autoplay: true,
            publish_passive_events: false,
            buffered_on_progress: false,
        }
    }
}

/// How the event ends the session, if it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// The resource played to the end
    Ended,
    /// The resource reported a media error
    Errored,
}

/// What the multiplexer must do after a rule ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    /// Publish the snapshot downstream
    pub publish: bool,
    /// Tell the resource to start playing
    pub start_playback: bool,
    /// Signal the end of the stream after publishing
    pub terminal: Option<Terminal>,
}

impl Effect {
    fn publish() -> Self {
        Self {
            publish: true,
            start_playback: false,
            terminal: None,
        }
    }

    fn passive(rules: &MutationRules) -> Self {
        Self {
            publish: rules.publish_passive_events,
            start_playback: false,
            terminal: None,
        }
    }

    fn terminal(terminal: Terminal) -> Self {
        Self {
            terminal: Some(terminal),
            ..Self::publish()
        }
    }
}

/// Field writes produced by one rule, computed from resource reads.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Update {
    Nothing,
    Duration(Option<f64>),
    Playing,
    Paused(bool),
    Time { current_time: f64, buffered: f64 },
    Position(f64),
    Rate(f64),
    Volume(f64),
    Buffered(f64),
    Ended,
    Error(ErrorInfo),
}

impl Update {
    /// Write the update into `snapshot`
    pub(crate) fn apply_to(self, snapshot: &mut Snapshot) {
        match self {
            Update::Nothing => {}
            Update::Duration(duration) => snapshot.duration = duration,
            Update::Playing => {
                snapshot.paused = false;
                snapshot.playing = true;
            }
            Update::Paused(paused) => {
                snapshot.paused = paused;
                snapshot.playing = !paused;
            }
            Update::Time {
                current_time,
                buffered,
            } => {
                snapshot.current_time = current_time;
                snapshot.buffered = buffered;
            }
            Update::Position(current_time) => snapshot.current_time = current_time,
            Update::Rate(rate) => snapshot.playback_rate = rate,
            Update::Volume(volume) => snapshot.volume = volume,
            Update::Buffered(buffered) => snapshot.buffered = buffered,
            Update::Ended => snapshot.ended = true,
            Update::Error(error) => snapshot.error = Some(error),
        }
    }
}

/// Run the rule for `event` against the resource without touching any
/// snapshot.
///
/// The resource getters may raise further events, so callers must not hold
/// the snapshot lock while this runs.
pub(crate) fn observe(
    event: MediaEvent,
    resource: &dyn MediaResource,
    rules: &MutationRules,
) -> (Update, Effect) {
    match event {
        MediaEvent::LoadStart
        | MediaEvent::LoadedData
        | MediaEvent::LoadedMetadata
        | MediaEvent::CanPlayThrough
        | MediaEvent::Stalled
        | MediaEvent::Suspend
        | MediaEvent::Emptied
        | MediaEvent::Waiting => (Update::Nothing, Effect::passive(rules)),

        MediaEvent::CanPlay => (
            Update::Nothing,
            Effect {
                start_playback: rules.autoplay,
                ..Effect::passive(rules)
            },
        ),

        MediaEvent::DurationChange => (Update::Duration(resource.duration()), Effect::publish()),

        MediaEvent::Play | MediaEvent::Playing => (Update::Playing, Effect::publish()),

        MediaEvent::Pause => (Update::Paused(resource.paused()), Effect::publish()),

        MediaEvent::TimeUpdate => (
            Update::Time {
                current_time: resource.current_time(),
                buffered: resource.buffered_end(),
            },
            Effect::publish(),
        ),

        MediaEvent::Seeking | MediaEvent::Seeked => {
            (Update::Position(resource.current_time()), Effect::publish())
        }

        MediaEvent::RateChange => (Update::Rate(resource.playback_rate()), Effect::publish()),

        MediaEvent::VolumeChange => (Update::Volume(resource.volume()), Effect::publish()),

        MediaEvent::Ended => (Update::Ended, Effect::terminal(Terminal::Ended)),

        MediaEvent::Error => (
            Update::Error(resource.error().unwrap_or_else(ErrorInfo::unreported)),
            Effect::terminal(Terminal::Errored),
        ),

        MediaEvent::Progress if rules.buffered_on_progress => {
            (Update::Buffered(resource.buffered_end()), Effect::publish())
        }

        MediaEvent::Progress => (Update::Nothing, Effect::passive(rules)),
    }
}

/// Apply the rule for `event`, reading whatever it needs from the resource.
///
/// Only the fields named by the event's rule are touched.
pub fn apply(
    event: MediaEvent,
    snapshot: &mut Snapshot,
    resource: &dyn MediaResource,
    rules: &MutationRules,
) -> Effect {
    let (update, effect) = observe(event, resource, rules);
    update.apply_to(snapshot);
    effect
}
