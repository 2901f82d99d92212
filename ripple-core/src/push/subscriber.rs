//! Subscriber types for the push graph.
//!
//! A Subscriber is the downstream end of an edge. It carries a callback that
//! an upstream node invokes after it publishes a new value. The callback
//! reports whether its target still exists: a dependent that has been dropped
//! answers `false` and is removed from the registry on the spot.
//!
//! Registries never hold their dependents alive. The callbacks capture weak
//! references, so the only strong references in the graph point upstream.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

/// Unique identifier for a subscriber.
///
/// Each registered edge gets a unique ID when created. The ID is used for
/// logging and for telling edges apart in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber to a node's pushes.
///
/// The callback is stored as a boxed trait object so that every dependent
/// kind (transform, map cache, sink) can register the behavior it needs.
/// It returns `true` while its target is alive and `false` once the target
/// has been dropped.
pub struct Subscriber {
    id: SubscriberId,
    notify: Box<dyn Fn() -> bool + Send + Sync>,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Box::new(notify),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Notify the subscriber that the value it watches has changed.
    ///
    /// Returns `false` if the subscribing node no longer exists.
    pub fn notify(&self) -> bool {
        (self.notify)()
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Registry of subscribers held by a node.
///
/// Dispatch runs the callbacks outside the registry lock, so a callback may
/// register further subscribers on the same node without deadlocking.
pub(crate) struct SubscriberSet {
    entries: Mutex<Vec<Subscriber>>,
}

impl SubscriberSet {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Register a subscriber. Registration order is dispatch order.
    pub(crate) fn insert(&self, subscriber: Subscriber) {
        self.entries.lock().push(subscriber);
    }

    /// Number of registered subscribers, dead ones included until the next
    /// dispatch prunes them.
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Invoke every subscriber in registration order and drop the ones whose
    /// targets are gone.
    pub(crate) fn dispatch(&self) {
        let batch = std::mem::take(&mut *self.entries.lock());
        let mut live = Vec::with_capacity(batch.len());
        for subscriber in batch {
            if subscriber.notify() {
                live.push(subscriber);
            } else {
                trace!(subscriber = ?subscriber.id(), "pruning dead subscriber");
            }
        }
        let mut entries = self.entries.lock();
        // Subscribers registered while the batch ran keep their place after
        // the survivors.
        let added = std::mem::replace(&mut *entries, live);
        entries.extend(added);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn subscriber_notify_calls_callback() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let subscriber = Subscriber::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            true
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(subscriber.notify());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_runs_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new();

        for label in 0..3 {
            let order = order.clone();
            set.insert(Subscriber::new(move || {
                order.lock().push(label);
                true
            }));
        }

        set.dispatch();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn dispatch_prunes_dead_subscribers() {
        let calls = Arc::new(AtomicI32::new(0));
        let set = SubscriberSet::new();

        let calls_clone = calls.clone();
        set.insert(Subscriber::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            true
        }));
        set.insert(Subscriber::new(|| false));
        assert_eq!(set.len(), 2);

        set.dispatch();
        assert_eq!(set.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        set.dispatch();
        assert_eq!(set.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registration_during_dispatch_is_kept() {
        let set = Arc::new(SubscriberSet::new());
        let calls = Arc::new(AtomicI32::new(0));

        let set_clone = set.clone();
        let calls_clone = calls.clone();
        set.insert(Subscriber::new(move || {
            if calls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                let inner_calls = calls_clone.clone();
                set_clone.insert(Subscriber::new(move || {
                    inner_calls.fetch_add(10, Ordering::SeqCst);
                    true
                }));
            }
            true
        }));

        set.dispatch();
        assert_eq!(set.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        set.dispatch();
        // Original plus the one registered mid-dispatch.
        assert_eq!(calls.load(Ordering::SeqCst), 12);
    }
}
