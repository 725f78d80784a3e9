//! Consumer side of a subscription.
//!
//! [`SnapshotStream`] is a `futures::Stream` for async hosts. Sync hosts can
//! poll it with [`SnapshotStream::try_next`] or block on
//! [`SnapshotStream::iter`]:
//!
//! ```rust,ignore
//! let mut stream = controller.play("track.mp3").subscribe()?;
//!
//! // Async
//! while let Some(item) = stream.next().await {
//!     println!("t={:.1}", item?.current_time);
//! }
//!
//! // Sync, outside of any runtime
//! for item in stream.iter() {
//!     println!("t={:.1}", item?.current_time);
//! }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use media_state::Snapshot;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::session::{Item, SessionCore};
use crate::types::{SessionId, TeardownReason};

/// Ordered snapshots of one subscription.
///
/// Yields `Ok(snapshot)` for every publication and `Err` only when setup
/// failed. Ends after the session is torn down and buffered snapshots have
/// been read. Dropping the stream unsubscribes.
pub struct SnapshotStream {
    core: Arc<SessionCore>,
    receiver: mpsc::UnboundedReceiver<Item>,
}

impl SnapshotStream {
    pub(crate) fn new(core: Arc<SessionCore>, receiver: mpsc::UnboundedReceiver<Item>) -> Self {
        Self { core, receiver }
    }

    /// Identifier of this subscription
    pub fn session_id(&self) -> SessionId {
        self.core.id()
    }

    /// Whether the session has been torn down
    ///
    /// Snapshots published before teardown may still be buffered.
    pub fn is_terminated(&self) -> bool {
        self.core.is_torn_down()
    }

    /// Why the session ended, once it has
    pub fn termination(&self) -> Option<TeardownReason> {
        self.core.reason()
    }

    /// Unsubscribe
    ///
    /// Already buffered snapshots stay readable. Has no effect on a session
    /// that is already torn down.
    pub fn close(&mut self) -> bool {
        self.core.teardown(TeardownReason::Unsubscribed)
    }

    /// Wait for the next item
    ///
    /// Returns `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<Snapshot>> {
        self.receiver.recv().await
    }

    /// Take the next item if one is buffered
    ///
    /// Returns `None` when nothing is buffered, including after the end.
    pub fn try_next(&mut self) -> Option<Result<Snapshot>> {
        self.receiver.try_recv().ok()
    }

    /// Block until the next item
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_recv(&mut self) -> Option<Result<Snapshot>> {
        self.receiver.blocking_recv()
    }

    /// Blocking iterator that runs until the stream ends
    pub fn iter(&mut self) -> BlockingSnapshots<'_> {
        BlockingSnapshots { inner: self }
    }

    /// Non-blocking iterator over currently buffered items
    pub fn try_iter(&mut self) -> BufferedSnapshots<'_> {
        BufferedSnapshots { inner: self }
    }

    #[cfg(test)]
    pub(crate) fn core(&self) -> &Arc<SessionCore> {
        &self.core
    }
}

impl Stream for SnapshotStream {
    type Item = Result<Snapshot>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        self.core.teardown(TeardownReason::Unsubscribed);
    }
}

impl std::fmt::Debug for SnapshotStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStream")
            .field("session_id", &self.session_id())
            .field("terminated", &self.is_terminated())
            .field("termination", &self.termination())
            .finish()
    }
}

/// Blocking iterator over a [`SnapshotStream`]
pub struct BlockingSnapshots<'a> {
    inner: &'a mut SnapshotStream,
}

impl Iterator for BlockingSnapshots<'_> {
    type Item = Result<Snapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.blocking_recv()
    }
}

/// Non-blocking iterator over buffered items of a [`SnapshotStream`]
pub struct BufferedSnapshots<'a> {
    inner: &'a mut SnapshotStream,
}

impl Iterator for BufferedSnapshots<'_> {
    type Item = Result<Snapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_next()
    }
}
