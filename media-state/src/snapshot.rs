//! The player-state record published on every relevant event.

use media_events::{ErrorInfo, MediaResource};
use serde::{Deserialize, Serialize};

/// Observable state of a media resource during one session.
///
/// Each emission is a full, self-consistent copy; consumers never see a
/// partial diff or a live alias of the multiplexer's record.
///
/// `playing` and `paused` can disagree for the short window between a
/// pause-initiated event and the resource's next state event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Source the session was started with
    pub src: String,
    /// Playback is in progress
    pub playing: bool,
    /// The resource reports itself paused
    pub paused: bool,
    /// Playback position in seconds
    pub current_time: f64,
    /// Media duration in seconds, `None` while unknown
    pub duration: Option<f64>,
    /// Volume in `[0, 1]`
    pub volume: f64,
    /// Playback rate
    pub playback_rate: f64,
    /// End of the buffered range in seconds
    pub buffered: f64,
    /// Playback reached the end
    pub ended: bool,
    /// Media error reported by the resource
    pub error: Option<ErrorInfo>,
}

impl Snapshot {
    /// State of a freshly loaded source
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            playing: false,
            paused: true,
            current_time: 0.0,
            duration: None,
            volume: 1.0,
            playback_rate: 1.0,
            buffered: 0.0,
            ended: false,
            error: None,
        }
    }

    /// Initial state for a session, carrying over the resource's volume and
    /// rate (they survive a source change on the host)
    pub fn initial(src: impl Into<String>, resource: &dyn MediaResource) -> Self {
        Self {
            volume: resource.volume(),
            playback_rate: resource.playback_rate(),
            ..Self::new(src)
        }
    }

    /// Playback finished or failed
    pub fn is_terminal(&self) -> bool {
        self.ended || self.error.is_some()
    }

    /// Seconds left before the end, when the duration is known and finite
    pub fn remaining(&self) -> Option<f64> {
        self.duration
            .filter(|duration| duration.is_finite())
            .map(|duration| (duration - self.current_time).max(0.0))
    }

    /// Names of the fields that differ from `other`
    pub fn changed_fields(&self, other: &Snapshot) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.src != other.src {
            changed.push("src");
        }
        if self.playing != other.playing {
            changed.push("playing");
        }
        if self.paused != other.paused {
            changed.push("paused");
        }
        if self.current_time != other.current_time {
            changed.push("current_time");
        }
        if self.duration != other.duration {
            changed.push("duration");
        }
        if self.volume != other.volume {
            changed.push("volume");
        }
        if self.playback_rate != other.playback_rate {
            changed.push("playback_rate");
        }
        if self.buffered != other.buffered {
            changed.push("buffered");
        }
        if self.ended != other.ended {
            changed.push("ended");
        }
        if self.error != other.error {
            changed.push("error");
        }
        changed
    }
}
