//! Node Protocol
//!
//! Every vertex in the push graph speaks the same small protocol: it can
//! report its identity, hand out the latest value it published, report how
//! many times it has published, and accept subscribers that it will notify
//! after the next publish.
//!
//! # Push Model
//!
//! Values travel strictly downstream, at the moment they change:
//!
//! 1. A node computes a new value.
//!
//! 2. The value is published: the snapshot slot is swapped and the version
//!    is bumped.
//!
//! 3. Subscribers are notified, in registration order, after the publish.
//!    A dependent that reads back during its notification always sees the
//!    value that triggered it.
//!
//! Reading a node never computes anything. `current` returns the snapshot
//! from the most recent publish, so reads are cheap and never suspend.
//!
//! # Snapshots
//!
//! Published values live behind `Arc`. A snapshot handed out by `current`
//! is immutable and stays valid for as long as the caller keeps it, no
//! matter how many pushes happen afterwards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::subscriber::{Subscriber, SubscriberSet};

/// Unique identifier for a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Publish counter of a node.
///
/// The version changes exactly when the node publishes, including publishes
/// that produce a value equal to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    /// Get the raw counter value. The initial value of a node is version 0.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The protocol every graph vertex implements.
///
/// Node handles are cheap clones of shared state: cloning a handle yields a
/// second reference to the same vertex, not a new vertex. Handles may be
/// moved into a dependent to embed the upstream exclusively, or cloned first
/// to share it between several dependents.
pub trait Node: Send + Sync {
    /// The value type this node publishes.
    type Output: Send + Sync + 'static;

    /// Get the node's unique ID.
    fn id(&self) -> NodeId;

    /// Get the snapshot from the most recent publish.
    fn current(&self) -> Arc<Self::Output>;

    /// Get the number of publishes so far.
    fn version(&self) -> Version;

    /// Register a subscriber to be notified after each future publish.
    fn on_change(&self, subscriber: Subscriber);
}

/// Shared per-node publish machinery: snapshot slot, version counter, and
/// subscriber registry. Every node kind embeds one of these.
pub(crate) struct NodeState<T> {
    id: NodeId,
    value: RwLock<Arc<T>>,
    version: AtomicU64,
    subscribers: SubscriberSet,
}

impl<T> NodeState<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            id: NodeId::new(),
            value: RwLock::new(Arc::new(value)),
            version: AtomicU64::new(0),
            subscribers: SubscriberSet::new(),
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn current(&self) -> Arc<T> {
        Arc::clone(&self.value.read())
    }

    pub(crate) fn version(&self) -> Version {
        Version(self.version.load(Ordering::Acquire))
    }

    pub(crate) fn subscribe(&self, subscriber: Subscriber) {
        self.subscribers.insert(subscriber);
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Publish a new value: swap the snapshot, bump the version, then notify
    /// subscribers. The value lock is released before any callback runs.
    pub(crate) fn publish(&self, value: T) {
        {
            let mut slot = self.value.write();
            *slot = Arc::new(value);
        }
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(node = self.id.raw(), version, "published");
        self.subscribers.dispatch();
    }
}
