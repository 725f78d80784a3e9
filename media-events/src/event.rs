//! The media lifecycle event catalog and an event-keyed lookup table.

use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};

/// Named lifecycle events a media resource can raise.
///
/// The variant order is the dispatch table order used by [`EventTable`].
/// Display and `FromStr` use the host's event names (`"loadstart"`,
/// `"timeupdate"`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
    strum::EnumCount,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaEvent {
    /// The resource began looking for media data
    LoadStart,
    /// The first frame has finished loading
    LoadedData,
    /// Duration and dimensions are known
    LoadedMetadata,
    /// Enough data to start playing, maybe not to the end
    CanPlay,
    /// Enough data to play to the end without stalling
    CanPlayThrough,
    /// The duration attribute changed
    DurationChange,
    /// The media became empty (e.g. the source was cleared)
    Emptied,
    /// Playback reached the end of the media
    Ended,
    /// The resource failed; details in its error attribute
    Error,
    /// Playback was paused
    Pause,
    /// Playback was requested
    Play,
    /// Playback actually started or resumed
    Playing,
    /// Media data is being fetched
    Progress,
    /// The playback rate changed
    RateChange,
    /// A seek completed
    Seeked,
    /// A seek started
    Seeking,
    /// Data is unexpectedly not forthcoming
    Stalled,
    /// Media data loading was suspended
    Suspend,
    /// The current playback position changed
    TimeUpdate,
    /// Volume or muted state changed
    VolumeChange,
    /// Playback stopped for lack of data
    Waiting,
}

const SLOTS: usize = <MediaEvent as EnumCount>::COUNT;

impl MediaEvent {
    /// Host event name, e.g. `"durationchange"`
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Every event in the catalog, in table order
    pub fn all() -> Vec<MediaEvent> {
        MediaEvent::iter().collect()
    }

    /// Events after which the resource will not produce further state
    pub fn is_terminal(self) -> bool {
        matches!(self, MediaEvent::Ended | MediaEvent::Error)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Fixed-size table keyed by [`MediaEvent`].
///
/// Replaces string-keyed maps of event name to value: every slot is known at
/// compile time and lookups are plain array indexing.
pub struct EventTable<T> {
    slots: [Option<T>; SLOTS],
}

impl<T> EventTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Store a value for an event, returning the previous one
    pub fn insert(&mut self, event: MediaEvent, value: T) -> Option<T> {
        self.slots[event.index()].replace(value)
    }

    /// Get the value stored for an event
    pub fn get(&self, event: MediaEvent) -> Option<&T> {
        self.slots[event.index()].as_ref()
    }

    /// Remove and return the value stored for an event
    pub fn remove(&mut self, event: MediaEvent) -> Option<T> {
        self.slots[event.index()].take()
    }

    /// Check if an event has a value
    pub fn contains(&self, event: MediaEvent) -> bool {
        self.slots[event.index()].is_some()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Occupied slots in table order
    pub fn iter(&self) -> impl Iterator<Item = (MediaEvent, &T)> {
        MediaEvent::iter()
            .zip(self.slots.iter())
            .filter_map(|(event, slot)| slot.as_ref().map(|value| (event, value)))
    }

    /// Events with a value, in table order
    pub fn events(&self) -> Vec<MediaEvent> {
        self.iter().map(|(event, _)| event).collect()
    }

    /// Empty the table, returning every stored value in table order
    pub fn drain(&mut self) -> Vec<(MediaEvent, T)> {
        MediaEvent::iter()
            .zip(self.slots.iter_mut())
            .filter_map(|(event, slot)| slot.take().map(|value| (event, value)))
            .collect()
    }
}

impl<T> Default for EventTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for EventTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTable")
            .field("events", &self.events())
            .finish()
    }
}
