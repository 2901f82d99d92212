//! Push-Based Dataflow Primitives
//!
//! This module implements the core dataflow system: sources, transforms,
//! map caches, and sinks. These primitives form the nodes of a Ripple
//! computation graph.
//!
//! # Concepts
//!
//! ## Sources
//!
//! A Source is a settable leaf. Setting it publishes the new value and
//! synchronously pushes a recomputation cascade through every dependent,
//! depth first. Nothing is batched and nothing is deferred.
//!
//! ## Transforms
//!
//! A Transform derives one value from the current values of its
//! dependencies. It recomputes eagerly on every upstream push and caches
//! nothing beyond its latest output.
//!
//! ## Map Caches
//!
//! A MapCache maps a function over one container dependency element by
//! element and memoizes every result, keyed by element under a pluggable
//! equality policy. Non-container dependencies broadcast: their values
//! apply to every element, and a change to one invalidates the whole
//! cache at once.
//!
//! ## Sinks
//!
//! A Sink terminates a graph. It tracks the latest value of one upstream
//! node and hands out immutable snapshots of it on demand.
//!
//! # Implementation Notes
//!
//! Dependencies are explicit: every derived node names its inputs at
//! construction and subscribes to them then. There is no tracking context
//! and no scheduler. A node publishes its new value before notifying
//! dependents, so a dependent that recomputes always observes a fully
//! written upstream. Reads (`current`, `dereference`) never compute
//! anything.
//!
//! Strong references point upstream only. Downstream edges are callbacks
//! holding weak references, pruned when a dropped dependent fails to
//! upgrade at notification time.

mod node;
mod subscriber;
mod source;
mod transform;
mod expand;
mod map_cache;
mod sink;

pub use node::{Node, NodeId, Version};
pub use subscriber::{Subscriber, SubscriberId};
pub use source::Source;
pub use transform::{Transform, TransformArgs};
pub use expand::{ArgRole, MapArgs};
pub use map_cache::MapCache;
pub use sink::Sink;
