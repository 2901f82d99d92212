//! Map Cache Implementation
//!
//! A MapCache is the memoizing counterpart of a transform: it applies a
//! function element by element over one container dependency and remembers
//! every result it has ever produced, keyed by the element that produced it.
//!
//! # How a Pass Works
//!
//! A pass runs at construction and again whenever a dependency pushes:
//!
//! 1. Snapshot the container and every broadcast value. Broadcast values
//!    are read once per pass and applied to every element.
//!
//! 2. If the trigger was a broadcast dependency, every cached result was
//!    produced under a stale context: the function runs for every position
//!    and each result overwrites its cache entry.
//!
//! 3. If only the container changed, each element is looked up first. A hit
//!    reuses the stored result without touching the entry; a miss runs the
//!    function and stores the result.
//!
//! 4. The output vector is rebuilt either way, so its length always equals
//!    the container's. Entries for elements that have left the container
//!    are kept; the cache only ever grows.
//!
//! # Equality Policies
//!
//! Lookups use a pluggable equality/hash pair (see [`crate::cache`]). The
//! default defers to the element's own `Eq` and `Hash`. A coarser policy
//! trades precision for hits: any element policy-equal to a cached one
//! reuses that entry's result. Callers must keep the pair consistent with
//! each other and with the function; the table cannot check this.
//!
//! # Thread Safety
//!
//! The cache lock doubles as the pass lock and is held through the publish
//! and the downstream notifications, so passes over one node are serial and
//! dependents never observe a half-written pass.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{ElementCache, ElementEq, ElementHash, Natural};

use super::expand::{ArgRole, MapArgs};
use super::node::{Node, NodeId, NodeState, Version};
use super::subscriber::Subscriber;

/// What one pass produced, for the output slot and the log line.
struct PassOutcome<O> {
    output: Vec<O>,
    computed: usize,
    reused: usize,
}

type PassFn<E, O> =
    Box<dyn Fn(&mut ElementCache<E, O>, bool) -> PassOutcome<O> + Send + Sync>;

struct MapCacheInner<E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    state: NodeState<Vec<O>>,
    cache: Mutex<ElementCache<E, O>>,
    run: PassFn<E, O>,
}

impl<E, O> MapCacheInner<E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    fn pass(&self, scalars_changed: bool) {
        let mut cache = self.cache.lock();
        let outcome = (self.run)(&mut cache, scalars_changed);
        debug!(
            node = self.state.id().raw(),
            scalars_changed,
            computed = outcome.computed,
            reused = outcome.reused,
            entries = cache.len(),
            "map cache pass"
        );
        self.state.publish(outcome.output);
    }
}

/// An element-wise memoizing map over one container dependency.
///
/// Publishes `Vec<O>` with one output per element of the indexed
/// container, in container order.
///
/// # Example
///
/// ```rust,ignore
/// let numbers = Source::new(vec![1, 2, 3, 4]);
/// let labels = MapCache::new(|n: &i32| n.to_string(), numbers.clone());
///
/// // Overlapping values are not recomputed.
/// numbers.set(vec![3, 4, 5, 6]);
/// assert_eq!(labels.cache_len(), 6);
/// ```
pub struct MapCache<E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    inner: Arc<MapCacheInner<E, O>>,
}

impl<E, O> MapCache<E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// Create a map cache whose only dependency is the indexed container,
    /// memoized under the element type's own `Eq` and `Hash`.
    pub fn new<D, F>(function: F, dependencies: D) -> Self
    where
        E: Eq + Hash,
        D: MapArgs<0, F, Element = E, MapOutput = O> + Clone + Send + Sync + 'static,
        F: Send + Sync + 'static,
    {
        Self::indexed_with_policies::<0, _, _, _, _>(function, dependencies, Natural, Natural)
    }

    /// Like [`MapCache::new`], memoized under a caller-supplied
    /// equality/hash pair instead of the element type's own.
    pub fn with_policies<D, F, Q, H>(function: F, dependencies: D, equality: Q, hasher: H) -> Self
    where
        D: MapArgs<0, F, Element = E, MapOutput = O> + Clone + Send + Sync + 'static,
        F: Send + Sync + 'static,
        Q: ElementEq<E> + 'static,
        H: ElementHash<E> + 'static,
    {
        Self::indexed_with_policies::<0, _, _, _, _>(function, dependencies, equality, hasher)
    }

    /// Create a map cache over a dependency tuple with the indexed
    /// container at position `INDEXED`; the rest broadcast.
    pub fn indexed<const INDEXED: usize, D, F>(function: F, dependencies: D) -> Self
    where
        E: Eq + Hash,
        D: MapArgs<INDEXED, F, Element = E, MapOutput = O> + Clone + Send + Sync + 'static,
        F: Send + Sync + 'static,
    {
        Self::indexed_with_policies::<INDEXED, _, _, _, _>(function, dependencies, Natural, Natural)
    }

    /// Like [`MapCache::indexed`], with a caller-supplied equality/hash
    /// pair.
    pub fn indexed_with_policies<const INDEXED: usize, D, F, Q, H>(
        function: F,
        dependencies: D,
        equality: Q,
        hasher: H,
    ) -> Self
    where
        D: MapArgs<INDEXED, F, Element = E, MapOutput = O> + Clone + Send + Sync + 'static,
        F: Send + Sync + 'static,
        Q: ElementEq<E> + 'static,
        H: ElementHash<E> + 'static,
    {
        let run: PassFn<E, O> = {
            let deps = dependencies.clone();
            Box::new(move |cache, scalars_changed| {
                let elements = deps.elements();
                let apply = deps.bind(&function);
                let mut output = Vec::with_capacity(elements.len());
                let mut computed = 0;
                let mut reused = 0;
                for element in elements.iter() {
                    if !scalars_changed {
                        if let Some(found) = cache.lookup(element) {
                            output.push(found.clone());
                            reused += 1;
                            continue;
                        }
                    }
                    let value = apply(element);
                    cache.store(element.clone(), value.clone());
                    output.push(value);
                    computed += 1;
                }
                PassOutcome {
                    output,
                    computed,
                    reused,
                }
            })
        };

        // The construction pass fills the cache, so it runs like a
        // broadcast-triggered one.
        let mut cache = ElementCache::new(equality, hasher);
        let outcome = run(&mut cache, true);
        let output_len = outcome.output.len();
        let inner = Arc::new(MapCacheInner {
            state: NodeState::new(outcome.output),
            cache: Mutex::new(cache),
            run,
        });
        debug!(
            node = inner.state.id().raw(),
            output_len, "map cache constructed"
        );

        let weak = Arc::downgrade(&inner);
        dependencies.subscribe(&move |role| {
            let weak = weak.clone();
            let scalars_changed = matches!(role, ArgRole::Broadcast);
            Subscriber::new(move || match weak.upgrade() {
                Some(inner) => {
                    inner.pass(scalars_changed);
                    true
                }
                None => false,
            })
        });
        Self { inner }
    }

    /// Number of results retained so far. Grows monotonically; entries are
    /// never evicted.
    pub fn cache_len(&self) -> usize {
        self.inner.cache.lock().len()
    }

    /// Get the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.subscriber_count()
    }
}

impl<E, O> Node for MapCache<E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    type Output = Vec<O>;

    fn id(&self) -> NodeId {
        self.inner.state.id()
    }

    fn current(&self) -> Arc<Vec<O>> {
        self.inner.state.current()
    }

    fn version(&self) -> Version {
        self.inner.state.version()
    }

    fn on_change(&self, subscriber: Subscriber) {
        self.inner.state.subscribe(subscriber);
    }
}

impl<E, O> Clone for MapCache<E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E, O> Debug for MapCache<E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCache")
            .field("id", &self.id())
            .field("version", &self.version())
            .field("output_len", &self.current().len())
            .field("cache_len", &self.cache_len())
            .finish()
    }
}
