//! Source Implementation
//!
//! A Source is the settable leaf of the graph. It holds a value that the
//! caller assigns directly; every assignment publishes and pushes through
//! the graph synchronously, so by the time `set` returns, every dependent
//! reachable from this source has already recomputed.
//!
//! # Thread Safety
//!
//! Sources are thread-safe. Concurrent `set` calls from several threads are
//! memory-safe; the order in which their cascades interleave is unspecified.

use std::fmt::Debug;
use std::sync::Arc;

use super::node::{Node, NodeId, NodeState, Version};
use super::subscriber::Subscriber;

/// A settable leaf node holding a value of type T.
///
/// # Example
///
/// ```rust,ignore
/// let numbers = Source::new(vec![1, 2, 3]);
///
/// // Read the current snapshot
/// let snapshot = numbers.current();
///
/// // Assign a new value (pushes to all dependents before returning)
/// numbers.set(vec![4, 5, 6]);
/// ```
pub struct Source<T>
where
    T: Send + Sync + 'static,
{
    state: Arc<NodeState<T>>,
}

impl<T> Source<T>
where
    T: Send + Sync + 'static,
{
    /// Create a new source with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            state: Arc::new(NodeState::new(value)),
        }
    }

    /// Assign a new value and push it through the graph.
    pub fn set(&self, value: T) {
        self.state.publish(value);
    }

    /// Assign a value derived from the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let current = self.state.current();
            f(&current)
        };
        self.state.publish(next);
    }

    /// Get the number of registered subscribers. Dead entries count until
    /// the next push prunes them.
    pub fn subscriber_count(&self) -> usize {
        self.state.subscriber_count()
    }
}

impl<T> Node for Source<T>
where
    T: Send + Sync + 'static,
{
    type Output = T;

    fn id(&self) -> NodeId {
        self.state.id()
    }

    fn current(&self) -> Arc<T> {
        self.state.current()
    }

    fn version(&self) -> Version {
        self.state.version()
    }

    fn on_change(&self, subscriber: Subscriber) {
        self.state.subscribe(subscriber);
    }
}

impl<T> Clone for Source<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Debug for Source<T>
where
    T: Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id())
            .field("value", &self.current())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn source_set_and_current() {
        let source = Source::new(0);
        assert_eq!(*source.current(), 0);

        source.set(42);
        assert_eq!(*source.current(), 42);
    }

    #[test]
    fn source_update() {
        let source = Source::new(10);
        source.update(|v| v + 5);
        assert_eq!(*source.current(), 15);
    }

    #[test]
    fn source_notifies_subscribers() {
        let source = Source::new(0);
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        source.on_change(Subscriber::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            true
        }));

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        source.set(1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        source.set(2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn source_prunes_dead_subscribers() {
        let source = Source::new(0);
        source.on_change(Subscriber::new(|| false));
        assert_eq!(source.subscriber_count(), 1);

        source.set(1);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn source_clone_shares_state() {
        let source1 = Source::new(0);
        let source2 = source1.clone();
        assert_eq!(source1.id(), source2.id());

        source1.set(42);
        assert_eq!(*source2.current(), 42);

        source2.set(100);
        assert_eq!(*source1.current(), 100);
    }

    #[test]
    fn source_version_bumps_on_every_set() {
        let source = Source::new(5);
        assert_eq!(source.version().raw(), 0);

        source.set(6);
        source.set(6);
        assert_eq!(source.version().raw(), 2);
    }

    #[test]
    fn source_ids_are_unique() {
        let s1 = Source::new(0);
        let s2 = Source::new(0);
        let s3 = Source::new(0);

        assert_ne!(s1.id(), s2.id());
        assert_ne!(s2.id(), s3.id());
        assert_ne!(s1.id(), s3.id());
    }
}
