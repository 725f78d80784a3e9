//! Configuration types for playback sessions
//!
//! This module defines which lifecycle events a session wires, how the
//! optional mutation rules behave, and how sessions share a resource and a
//! cancellation signal.

use std::collections::HashSet;

use media_events::MediaEvent;
use media_state::MutationRules;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// What `subscribe()` does when another session holds the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Fail with `SessionError::ResourceBusy`
    #[default]
    Reject,
    /// Tear the active session down and take over
    Replace,
}

/// How long a controller keeps one cancellation signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalScope {
    /// Install a fresh signal after every `stop()`
    #[default]
    PerStop,
    /// One signal for the controller's lifetime; once stopped, every later
    /// session is cancelled as soon as it subscribes
    Lifetime,
}

/// Configuration for playback sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifecycle events the multiplexer listens to
    /// Default: the full catalog
    pub events: Vec<MediaEvent>,

    /// Call `play()` on the resource once it reports "canplay"
    /// Default: true
    pub autoplay: bool,

    /// Publish a snapshot for events that mutate nothing
    /// Default: false
    pub publish_passive_events: bool,

    /// Let "progress" refresh the buffered end
    /// Default: false
    pub buffered_on_progress: bool,

    /// Behavior when the resource already has an active session
    /// Default: Reject
    pub busy_policy: BusyPolicy,

    /// Lifetime of the controller's cancellation signal
    /// Default: PerStop
    pub signal_scope: SignalScope,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            events: MediaEvent::all(),
            autoplay: true,
            publish_passive_events: false,
            buffered_on_progress: false,
            busy_policy: BusyPolicy::Reject,
            signal_scope: SignalScope::PerStop,
        }
    }
}

impl SessionConfig {
    /// Create a new SessionConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SessionConfig that publishes on every wired event and tracks
    /// buffering progress
    pub fn verbose() -> Self {
        Self {
            publish_passive_events: true,
            buffered_on_progress: true,
            ..Default::default()
        }
    }

    /// Create a SessionConfig that waits for the host to start playback
    pub fn manual_start() -> Self {
        Self {
            autoplay: false,
            ..Default::default()
        }
    }

    /// Set the wired events
    pub fn with_events(mut self, events: impl IntoIterator<Item = MediaEvent>) -> Self {
        self.events = events.into_iter().collect();
        self
    }

    /// Enable or disable autoplay on "canplay"
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Enable or disable publishing for passive events
    pub fn with_publish_passive_events(mut self, publish: bool) -> Self {
        self.publish_passive_events = publish;
        self
    }

    /// Enable or disable buffered updates on "progress"
    pub fn with_buffered_on_progress(mut self, enabled: bool) -> Self {
        self.buffered_on_progress = enabled;
        self
    }

    /// Set the busy policy
    pub fn with_busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.busy_policy = policy;
        self
    }

    /// Set the signal scope
    pub fn with_signal_scope(mut self, scope: SignalScope) -> Self {
        self.signal_scope = scope;
        self
    }

    /// The rules handed to the multiplexer
    pub fn rules(&self) -> MutationRules {
        MutationRules {
            events: self.events.clone(),
            autoplay: self.autoplay,
            publish_passive_events: self.publish_passive_events,
            buffered_on_progress: self.buffered_on_progress,
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.events.is_empty() {
            return Err(SessionError::Configuration(
                "At least one event must be wired".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.events.iter().find(|event| !seen.insert(**event)) {
            return Err(SessionError::Configuration(format!(
                "Event '{duplicate}' is listed more than once"
            )));
        }

        // Without these the stream could only end by cancellation or drop
        for required in [MediaEvent::Ended, MediaEvent::Error] {
            if !self.events.contains(&required) {
                return Err(SessionError::Configuration(format!(
                    "Event '{required}' must be wired"
                )));
            }
        }

        if self.autoplay && !self.events.contains(&MediaEvent::CanPlay) {
            return Err(SessionError::Configuration(
                "Autoplay requires the 'canplay' event".to_string(),
            ));
        }

        Ok(())
    }
}
