//! Shared access to one media resource, with at most one active session.
//!
//! The claim belongs to the resource, not to the handle: every handle built
//! over the same resource allocation shares one claim slot, however many
//! controllers wrap it.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use media_events::MediaResource;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::BusyPolicy;
use crate::error::{Result, SessionError};
use crate::session::SessionCore;
use crate::types::{SessionId, TeardownReason};

struct Claim {
    session: SessionId,
    core: Weak<SessionCore>,
}

type ClaimSlot = Mutex<Option<Claim>>;

/// Claim slots of every resource wrapped by a live handle, keyed by the
/// resource's address.
///
/// A handle keeps its resource alive, so an address cannot be reused while
/// its slot is still reachable.
static CLAIMS: Mutex<BTreeMap<usize, Weak<ClaimSlot>>> =
    parking_lot::const_mutex(BTreeMap::new());

fn resource_key(resource: &Arc<dyn MediaResource>) -> usize {
    Arc::as_ptr(resource) as *const () as usize
}

/// The slot shared by every handle over `resource`
fn claim_slot(resource: &Arc<dyn MediaResource>) -> Arc<ClaimSlot> {
    let key = resource_key(resource);
    let mut claims = CLAIMS.lock();
    if let Some(slot) = claims.get(&key).and_then(Weak::upgrade) {
        return slot;
    }

    claims.retain(|_, slot| slot.strong_count() > 0);
    let slot = Arc::new(Mutex::new(None));
    claims.insert(key, Arc::downgrade(&slot));
    slot
}

struct HandleInner {
    resource: Arc<dyn MediaResource>,
    claim: Arc<ClaimSlot>,
}

/// Handle to a media resource shared by the sessions played on it.
///
/// A resource plays one source at a time, so the handle tracks which
/// session currently owns it. Every handle over the same resource, cloned
/// or built separately, sees the same claim.
#[derive(Clone)]
pub struct ResourceHandle {
    inner: Arc<HandleInner>,
}

impl ResourceHandle {
    /// Wrap a resource
    pub fn new(resource: Arc<dyn MediaResource>) -> Self {
        let claim = claim_slot(&resource);
        Self {
            inner: Arc::new(HandleInner { resource, claim }),
        }
    }

    /// The wrapped resource
    pub fn resource(&self) -> &Arc<dyn MediaResource> {
        &self.inner.resource
    }

    /// The session currently holding the resource
    pub fn active_session(&self) -> Option<SessionId> {
        self.inner
            .claim
            .lock()
            .as_ref()
            .filter(|claim| is_live(&claim.core))
            .map(|claim| claim.session)
    }

    /// Whether a session currently holds the resource
    pub fn is_busy(&self) -> bool {
        self.active_session().is_some()
    }

    /// Check if both handles wrap the same resource, and so share a claim
    pub fn same_resource(&self, other: &ResourceHandle) -> bool {
        Arc::ptr_eq(&self.inner.claim, &other.inner.claim)
    }

    /// Take the resource for `session`
    ///
    /// A live holder is either refused or torn down, depending on `policy`.
    /// The displaced session is torn down after the claim changed hands and
    /// without the claim lock held.
    pub(crate) fn claim(
        &self,
        session: SessionId,
        core: &Arc<SessionCore>,
        policy: BusyPolicy,
    ) -> Result<()> {
        let displaced = {
            let mut slot = self.inner.claim.lock();
            let holder = slot.as_ref().and_then(|claim| {
                claim
                    .core
                    .upgrade()
                    .filter(|core| !core.is_torn_down())
                    .map(|core| (claim.session, core))
            });

            if let (Some((holder_id, _)), BusyPolicy::Reject) = (&holder, policy) {
                warn!("{} refused: resource is busy with {}", session, holder_id);
                return Err(SessionError::ResourceBusy(*holder_id));
            }

            *slot = Some(Claim {
                session,
                core: Arc::downgrade(core),
            });
            holder
        };

        if let Some((holder_id, holder)) = displaced {
            debug!("{} replaces {} on the resource", session, holder_id);
            holder.teardown(TeardownReason::Replaced);
        }
        Ok(())
    }

    /// Give the resource back if `session` still holds it
    pub(crate) fn release(&self, session: SessionId) -> bool {
        let mut slot = self.inner.claim.lock();
        match slot.as_ref() {
            Some(claim) if claim.session == session => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}

fn is_live(core: &Weak<SessionCore>) -> bool {
    core.upgrade().is_some_and(|core| !core.is_torn_down())
}

impl<R: MediaResource + 'static> From<Arc<R>> for ResourceHandle {
    fn from(resource: Arc<R>) -> Self {
        Self::new(resource)
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("active_session", &self.active_session())
            .finish_non_exhaustive()
    }
}
