//! # media-state
//!
//! Player-state snapshots and the event multiplexer that keeps them current.
//!
//! A [`Multiplexer`] subscribes to every wired lifecycle event of one media
//! resource, applies each event's mutation rule to the single [`Snapshot`] it
//! owns, and hands a copy of the full snapshot to a [`SnapshotSink`] in the
//! resource's delivery order. The rules live in [`rules`] as a pure function
//! so they can be tested without a resource attached.

mod multiplexer;
pub mod rules;
mod snapshot;

pub use multiplexer::{Multiplexer, SnapshotSink};
pub use rules::{apply, Effect, MutationRules, Terminal};
pub use snapshot::Snapshot;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Multiplexer, MutationRules, Snapshot, SnapshotSink, Terminal};
}
