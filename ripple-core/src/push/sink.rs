//! Sink Implementation
//!
//! A Sink is the terminal end of a graph: it subscribes to one upstream
//! node and keeps a handle to the latest value that node published.
//! Dereferencing a sink is a lock-and-clone of an `Arc`; it never runs
//! user code and never triggers a recomputation.
//!
//! # Snapshot Semantics
//!
//! The `Arc` a dereference returns is immutable. Later pushes swap the
//! sink's slot to a new `Arc` but leave handed-out snapshots untouched,
//! so a reader can hold one across any number of pushes. Two dereferences
//! with no push in between return the identical `Arc`.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::node::Node;
use super::subscriber::Subscriber;

struct SinkInner<T>
where
    T: Send + Sync + 'static,
{
    upstream: Box<dyn Node<Output = T>>,
    latest: RwLock<Arc<T>>,
}

/// A terminal reader over any node.
///
/// # Example
///
/// ```rust,ignore
/// let price = Source::new(12.5_f64);
/// let with_tax = Transform::new(|p: &f64| p * 1.2, price.clone());
/// let sink = Sink::new(with_tax);
///
/// price.set(20.0);
/// assert_eq!(*sink.dereference(), 24.0);
/// ```
pub struct Sink<T>
where
    T: Send + Sync + 'static,
{
    inner: Arc<SinkInner<T>>,
}

impl<T> Sink<T>
where
    T: Send + Sync + 'static,
{
    /// Attach a sink to `upstream` and start tracking its pushes. The
    /// sink is primed with the upstream's current value.
    pub fn new<D>(upstream: D) -> Self
    where
        D: Node<Output = T> + 'static,
    {
        let latest = RwLock::new(upstream.current());
        let inner = Arc::new(SinkInner {
            upstream: Box::new(upstream),
            latest,
        });

        let weak = Arc::downgrade(&inner);
        inner
            .upstream
            .on_change(Subscriber::new(move || match weak.upgrade() {
                Some(inner) => {
                    let value = inner.upstream.current();
                    *inner.latest.write() = value;
                    true
                }
                None => false,
            }));
        Self { inner }
    }

    /// Clone out the latest snapshot.
    pub fn dereference(&self) -> Arc<T> {
        self.inner.latest.read().clone()
    }
}

impl<T> Clone for Sink<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Sink<T>
where
    T: Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("upstream", &self.inner.upstream.id())
            .field("value", &*self.dereference())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::source::Source;
    use super::super::transform::Transform;
    use super::*;

    #[test]
    fn sink_is_primed_at_construction() {
        let source = Source::new(21);
        let sink = Sink::new(source);
        assert_eq!(*sink.dereference(), 21);
    }

    #[test]
    fn sink_tracks_pushes() {
        let source = Source::new(1);
        let sink = Sink::new(source.clone());

        source.set(2);
        assert_eq!(*sink.dereference(), 2);
        source.set(3);
        assert_eq!(*sink.dereference(), 3);
    }

    #[test]
    fn repeated_dereference_returns_the_same_snapshot() {
        let source = Source::new(String::from("a"));
        let sink = Sink::new(source.clone());

        let first = sink.dereference();
        let second = sink.dereference();
        assert!(Arc::ptr_eq(&first, &second));

        source.set(String::from("b"));
        assert!(!Arc::ptr_eq(&first, &sink.dereference()));
    }

    #[test]
    fn held_snapshot_survives_later_pushes() {
        let source = Source::new(vec![1, 2, 3]);
        let sink = Sink::new(source.clone());

        let old = sink.dereference();
        source.set(vec![4, 5]);
        assert_eq!(*old, vec![1, 2, 3]);
        assert_eq!(*sink.dereference(), vec![4, 5]);
    }

    #[test]
    fn sink_over_a_transform_chain() {
        let base = Source::new(2);
        let doubled = Transform::new(|n: &i32| n * 2, base.clone());
        let shifted = Transform::new(|n: &i32| n + 1, doubled);
        let sink = Sink::new(shifted);
        assert_eq!(*sink.dereference(), 5);

        base.set(10);
        assert_eq!(*sink.dereference(), 21);
    }

    #[test]
    fn dropped_sink_unsubscribes_on_next_push() {
        let source = Source::new(0);
        let sink = Sink::new(source.clone());
        assert_eq!(source.subscriber_count(), 1);

        drop(sink);
        source.set(1);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn two_sinks_track_the_same_node_independently() {
        let source = Source::new(7);
        let left = Sink::new(source.clone());
        let right = Sink::new(source.clone());

        source.set(8);
        assert_eq!(*left.dereference(), 8);
        assert_eq!(*right.dereference(), 8);
        assert_eq!(source.subscriber_count(), 2);
    }

    #[test]
    fn sink_clone_shares_state() {
        let source = Source::new(1);
        let sink = Sink::new(source.clone());
        let other = sink.clone();

        source.set(42);
        assert_eq!(*other.dereference(), 42);
        assert_eq!(source.subscriber_count(), 1);
    }
}
