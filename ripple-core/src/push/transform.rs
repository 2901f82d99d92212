//! Transform Implementation
//!
//! A Transform is a derived node with no caching: it applies a function to
//! the current values of its dependencies and publishes the result. The
//! function runs once at construction and again, eagerly, every time any
//! dependency pushes.
//!
//! # Dependency Lists
//!
//! The `dependencies` argument is `()`, a single node handle, or a tuple of
//! up to six handles. The function receives one reference per dependency,
//! in tuple order. Arity and parameter types are checked at compile time by
//! the [`TransformArgs`] implementation for the dependency list.
//!
//! # Thread Safety
//!
//! Each transform runs its passes under a private lock held through the
//! publish and the downstream notifications, so two triggering pushes never
//! interleave their writes to the same transform.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::node::{Node, NodeId, NodeState, Version};
use super::subscriber::Subscriber;

/// A dependency list accepted by [`Transform::new`].
///
/// Implemented for `()`, for any single node handle, and for tuples of node
/// handles up to arity six. `F` is the transform function; each
/// implementation pins its arity and parameter types to the list, so a
/// mismatched function fails to compile instead of failing at runtime.
pub trait TransformArgs<F> {
    /// The value type the function produces.
    type Output: Send + Sync + 'static;

    /// Bundle the function and cloned dependency handles into a recompute
    /// closure that reads every current value.
    fn reader(&self, function: F) -> Box<dyn Fn() -> Self::Output + Send + Sync>;

    /// Register one subscriber per dependency.
    fn subscribe(&self, make: &dyn Fn() -> Subscriber);
}

impl<F, O> TransformArgs<F> for ()
where
    F: Fn() -> O + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    type Output = O;

    fn reader(&self, function: F) -> Box<dyn Fn() -> O + Send + Sync> {
        Box::new(move || function())
    }

    fn subscribe(&self, _make: &dyn Fn() -> Subscriber) {}
}

impl<D, F, O> TransformArgs<F> for D
where
    D: Node + Clone + 'static,
    F: Fn(&D::Output) -> O + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    type Output = O;

    fn reader(&self, function: F) -> Box<dyn Fn() -> O + Send + Sync> {
        let dep = self.clone();
        Box::new(move || function(&*dep.current()))
    }

    fn subscribe(&self, make: &dyn Fn() -> Subscriber) {
        self.on_change(make());
    }
}

macro_rules! impl_transform_args {
    ($($D:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($D,)+ F, O> TransformArgs<F> for ($($D,)+)
        where
            $($D: Node + Clone + 'static,)+
            F: Fn($(&<$D as Node>::Output,)+) -> O + Send + Sync + 'static,
            O: Send + Sync + 'static,
        {
            type Output = O;

            fn reader(&self, function: F) -> Box<dyn Fn() -> O + Send + Sync> {
                let ($($D,)+) = self;
                $(let $D = $D.clone();)+
                Box::new(move || function($(&*$D.current(),)+))
            }

            fn subscribe(&self, make: &dyn Fn() -> Subscriber) {
                let ($($D,)+) = self;
                $($D.on_change(make());)+
            }
        }
    };
}

impl_transform_args!(A);
impl_transform_args!(A, B);
impl_transform_args!(A, B, C);
impl_transform_args!(A, B, C, D);
impl_transform_args!(A, B, C, D, E);
impl_transform_args!(A, B, C, D, E, G);

struct TransformInner<T>
where
    T: Send + Sync + 'static,
{
    state: NodeState<T>,
    read: Box<dyn Fn() -> T + Send + Sync>,
    pass: Mutex<()>,
}

impl<T> TransformInner<T>
where
    T: Send + Sync + 'static,
{
    fn recompute(&self) {
        let _pass = self.pass.lock();
        let value = (self.read)();
        trace!(node = self.state.id().raw(), "transform recomputed");
        self.state.publish(value);
    }
}

/// A derived node that recomputes eagerly on every upstream push.
///
/// # Example
///
/// ```rust,ignore
/// let base = Source::new(vec![1, 2, 3]);
/// let total = Transform::new(|v: &Vec<i32>| v.iter().sum::<i32>(), base.clone());
///
/// base.set(vec![10, 20]);
/// assert_eq!(*total.current(), 30);
/// ```
pub struct Transform<T>
where
    T: Send + Sync + 'static,
{
    inner: Arc<TransformInner<T>>,
}

impl<T> Transform<T>
where
    T: Send + Sync + 'static,
{
    /// Create a transform over the given dependency list.
    ///
    /// The function runs once before this returns, so the node is readable
    /// immediately. Afterwards it runs again on every upstream push.
    pub fn new<D, F>(function: F, dependencies: D) -> Self
    where
        D: TransformArgs<F, Output = T>,
    {
        let read = dependencies.reader(function);
        let initial = read();
        let inner = Arc::new(TransformInner {
            state: NodeState::new(initial),
            read,
            pass: Mutex::new(()),
        });
        let weak = Arc::downgrade(&inner);
        dependencies.subscribe(&move || {
            let weak = weak.clone();
            Subscriber::new(move || match weak.upgrade() {
                Some(inner) => {
                    inner.recompute();
                    true
                }
                None => false,
            })
        });
        Self { inner }
    }

    /// Get the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.subscriber_count()
    }
}

impl<T> Node for Transform<T>
where
    T: Send + Sync + 'static,
{
    type Output = T;

    fn id(&self) -> NodeId {
        self.inner.state.id()
    }

    fn current(&self) -> Arc<T> {
        self.inner.state.current()
    }

    fn version(&self) -> Version {
        self.inner.state.version()
    }

    fn on_change(&self, subscriber: Subscriber) {
        self.inner.state.subscribe(subscriber);
    }
}

impl<T> Clone for Transform<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Transform<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("id", &self.id())
            .field("version", &self.version())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
