//! Cancellation signal shared by the sessions of one controller.
//!
//! The signal carries no payload. [`CancellationSignal::fire`] runs every
//! registered hook synchronously, in registration order, and latches: a hook
//! registered after the signal fired runs immediately.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct SignalState {
    fired: bool,
    next_id: u64,
    hooks: BTreeMap<u64, Hook>,
}

/// Broadcast stop notification.
///
/// Clones refer to the same signal.
#[derive(Clone, Default)]
pub struct CancellationSignal {
    state: Arc<Mutex<SignalState>>,
}

impl CancellationSignal {
    /// Create a signal that has not fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal, running every registered hook before returning
    ///
    /// Returns the number of hooks run. Firing an already fired signal is a
    /// no-op.
    pub fn fire(&self) -> usize {
        let hooks = {
            let mut state = self.state.lock();
            if state.fired {
                return 0;
            }
            state.fired = true;
            std::mem::take(&mut state.hooks)
        };

        let count = hooks.len();
        trace!("Cancellation signal fired, notifying {} subscriber(s)", count);
        for (_, hook) in hooks {
            hook();
        }
        count
    }

    /// Whether the signal has fired
    pub fn is_fired(&self) -> bool {
        self.state.lock().fired
    }

    /// Number of hooks waiting for the signal
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().hooks.len()
    }

    /// Check if both values refer to the same signal
    pub fn same_signal(&self, other: &CancellationSignal) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Register a hook to run when the signal fires
    ///
    /// On an already fired signal the hook runs before this returns. The
    /// hook is unregistered when the returned subscription is dropped.
    pub fn subscribe<F>(&self, hook: F) -> SignalSubscription
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.fired {
            drop(state);
            hook();
            return SignalSubscription {
                state: Weak::new(),
                id: None,
            };
        }

        let id = state.next_id;
        state.next_id += 1;
        state.hooks.insert(id, Box::new(hook));

        SignalSubscription {
            state: Arc::downgrade(&self.state),
            id: Some(id),
        }
    }
}

impl std::fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CancellationSignal")
            .field("fired", &state.fired)
            .field("subscribers", &state.hooks.len())
            .finish()
    }
}

/// Registration of one hook on a [`CancellationSignal`].
#[derive(Debug)]
pub struct SignalSubscription {
    state: Weak<Mutex<SignalState>>,
    id: Option<u64>,
}

impl SignalSubscription {
    /// Whether the hook is still waiting for the signal
    pub fn is_pending(&self) -> bool {
        match (self.id, self.state.upgrade()) {
            (Some(id), Some(state)) => state.lock().hooks.contains_key(&id),
            _ => false,
        }
    }
}

impl Drop for SignalSubscription {
    fn drop(&mut self) {
        if let (Some(id), Some(state)) = (self.id, self.state.upgrade()) {
            // Take the hook out first so it is dropped without the lock held
            let hook = state.lock().hooks.remove(&id);
            drop(hook);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_hook(count: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
        let count = Arc::clone(count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_fire_runs_every_hook_once() {
        let signal = CancellationSignal::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _a = signal.subscribe(counting_hook(&count));
        let _b = signal.subscribe(counting_hook(&count));
        assert_eq!(signal.subscriber_count(), 2);

        assert_eq!(signal.fire(), 2);
        assert_eq!(signal.fire(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(signal.is_fired());
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribe_after_fire_runs_immediately() {
        let signal = CancellationSignal::new();
        signal.fire();

        let count = Arc::new(AtomicUsize::new(0));
        let subscription = signal.subscribe(counting_hook(&count));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!subscription.is_pending());
    }

    #[test]
    fn test_dropped_subscription_is_not_notified() {
        let signal = CancellationSignal::new();
        let count = Arc::new(AtomicUsize::new(0));

        let subscription = signal.subscribe(counting_hook(&count));
        assert!(subscription.is_pending());
        drop(subscription);

        assert_eq!(signal.fire(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hook_may_drop_its_own_subscription() {
        let signal = CancellationSignal::new();
        let slot: Arc<Mutex<Option<SignalSubscription>>> = Arc::new(Mutex::new(None));

        let inner = Arc::clone(&slot);
        let subscription = signal.subscribe(move || {
            inner.lock().take();
        });
        *slot.lock() = Some(subscription);

        assert_eq!(signal.fire(), 1);
        assert!(slot.lock().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = CancellationSignal::new();
        let clone = signal.clone();
        assert!(signal.same_signal(&clone));
        assert!(!signal.same_signal(&CancellationSignal::new()));

        clone.fire();
        assert!(signal.is_fired());
    }
}
