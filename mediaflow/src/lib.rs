//! # mediaflow
//!
//! One cancellable stream of player-state snapshots in place of a callback
//! per media lifecycle event.
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use mediaflow::prelude::*;
//!
//! let controller = AudioController::new(resource);
//! let mut stream = controller.play("track.mp3").subscribe()?;
//!
//! while let Some(snapshot) = stream.next().await {
//!     let snapshot = snapshot?;
//!     println!("{:.1}s / {:?}", snapshot.current_time, snapshot.duration);
//! }
//! ```
//!
//! The stream ends by itself on "ended" or "error". Dropping it, closing it,
//! or calling [`AudioController::stop`] ends it early; in every case the
//! resource is paused, its source cleared and every listener released,
//! exactly once.

mod config;
mod controller;
mod error;
mod handle;
mod session;
mod signal;
mod stream;
mod types;

pub use config::{BusyPolicy, SessionConfig, SignalScope};
pub use controller::AudioController;
pub use error::{Result, SessionError};
pub use handle::ResourceHandle;
pub use session::PlaybackSession;
pub use signal::{CancellationSignal, SignalSubscription};
pub use stream::{BlockingSnapshots, BufferedSnapshots, SnapshotStream};
pub use types::{SessionId, TeardownReason};

pub use media_events::{ErrorInfo, MediaErrorCode, MediaEvent, MediaResource, ResourceError};
pub use media_state::Snapshot;

#[cfg(feature = "test-support")]
pub use media_events::ScriptedResource;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AudioController, CancellationSignal, MediaEvent, MediaResource, PlaybackSession,
        SessionConfig, SessionError, Snapshot, SnapshotStream, TeardownReason,
    };
}
