//! Indexed Expansion
//!
//! A map cache applies its function element by element over exactly one
//! container dependency while every other dependency contributes its whole
//! value to each call. This module types that split: the [`MapArgs`] trait
//! describes a dependency list with the container at const position
//! `INDEXED`, and [`ArgRole`] tags each subscription with the part its
//! dependency plays.
//!
//! The trait is implemented for a bare container handle (`INDEXED = 0`) and
//! for tuples up to arity four at every position. Each implementation also
//! fixes the map function's arity and parameter types, so a function that
//! does not line up with the dependency list is rejected at compile time.

use std::sync::Arc;

use super::node::Node;
use super::subscriber::Subscriber;

/// Role a dependency plays in a map cache's argument list. Fixed when the
/// node is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRole {
    /// The container argument. Its elements drive the output, one call per
    /// position.
    Indexed,
    /// A broadcast argument. Its whole value is handed to every element
    /// call of a pass.
    Broadcast,
}

/// A dependency list accepted by the map cache constructors, with the
/// container dependency at position `INDEXED`.
///
/// `F` is the map function: one parameter per dependency in tuple order,
/// where the `INDEXED` parameter is a borrowed element and every other
/// parameter is the borrowed value of its dependency.
pub trait MapArgs<const INDEXED: usize, F> {
    /// Element type of the indexed container.
    type Element: Send + Sync + 'static;
    /// Value type the map function produces per element.
    type MapOutput: Send + Sync + 'static;

    /// Snapshot of the indexed container's current value.
    fn elements(&self) -> Arc<Vec<Self::Element>>;

    /// Snapshot every broadcast dependency once and close over the function,
    /// yielding the per-element computation for one pass.
    fn bind<'f>(
        &self,
        function: &'f F,
    ) -> Box<dyn Fn(&Self::Element) -> Self::MapOutput + 'f>;

    /// Register one role-tagged subscriber per dependency.
    fn subscribe(&self, make: &dyn Fn(ArgRole) -> Subscriber);
}

impl<D, E, F, O> MapArgs<0, F> for D
where
    D: Node<Output = Vec<E>> + 'static,
    E: Send + Sync + 'static,
    F: Fn(&E) -> O + Send + Sync,
    O: Send + Sync + 'static,
{
    type Element = E;
    type MapOutput = O;

    fn elements(&self) -> Arc<Vec<E>> {
        self.current()
    }

    fn bind<'f>(&self, function: &'f F) -> Box<dyn Fn(&E) -> O + 'f> {
        Box::new(move |element| function(element))
    }

    fn subscribe(&self, make: &dyn Fn(ArgRole) -> Subscriber) {
        self.on_change(make(ArgRole::Indexed));
    }
}

macro_rules! impl_map_args {
    ($index:tt => $($pre:ident)* ; $container:ident ; $($post:ident)*) => {
        #[allow(non_snake_case)]
        impl<$($pre,)* $container, $($post,)* E, F, O> MapArgs<$index, F>
            for ($($pre,)* $container, $($post,)*)
        where
            $($pre: Node + 'static,)*
            $container: Node<Output = Vec<E>> + 'static,
            $($post: Node + 'static,)*
            E: Send + Sync + 'static,
            F: Fn($(&<$pre as Node>::Output,)* &E, $(&<$post as Node>::Output,)*) -> O
                + Send
                + Sync,
            O: Send + Sync + 'static,
        {
            type Element = E;
            type MapOutput = O;

            fn elements(&self) -> Arc<Vec<E>> {
                self.$index.current()
            }

            fn bind<'f>(&self, function: &'f F) -> Box<dyn Fn(&E) -> O + 'f> {
                let ($($pre,)* _, $($post,)*) = self;
                $(let $pre = $pre.current();)*
                $(let $post = $post.current();)*
                Box::new(move |element| function($(&*$pre,)* element, $(&*$post,)*))
            }

            fn subscribe(&self, make: &dyn Fn(ArgRole) -> Subscriber) {
                let ($($pre,)* $container, $($post,)*) = self;
                $($pre.on_change(make(ArgRole::Broadcast));)*
                $container.on_change(make(ArgRole::Indexed));
                $($post.on_change(make(ArgRole::Broadcast));)*
            }
        }
    };
}

impl_map_args!(0 => ; C ;);
impl_map_args!(0 => ; C ; B0);
impl_map_args!(1 => A0 ; C ;);
impl_map_args!(0 => ; C ; B0 B1);
impl_map_args!(1 => A0 ; C ; B0);
impl_map_args!(2 => A0 A1 ; C ;);
impl_map_args!(0 => ; C ; B0 B1 B2);
impl_map_args!(1 => A0 ; C ; B0 B1);
impl_map_args!(2 => A0 A1 ; C ; B0);
impl_map_args!(3 => A0 A1 A2 ; C ;);
