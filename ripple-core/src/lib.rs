//! Ripple Core
//!
//! This crate provides the core runtime for the Ripple push-based dataflow
//! library. It implements:
//!
//! - Graph nodes (sources, transforms, map caches, sinks)
//! - Element-wise result memoization with pluggable equality policies
//! - Synchronous push propagation with snapshot reads
//!
//! Values flow one way. Writers push through sources; every other node is
//! derived, recomputed during the push, and read through cheap immutable
//! snapshots.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `push`: Node types and the push propagation machinery
//! - `cache`: The memo table and equality policies behind map caches
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::push::{MapCache, Sink, Source};
//!
//! // A settable container of work items.
//! let items = Source::new(vec![1, 2, 3, 4]);
//!
//! // Map over it element by element; each result is memoized.
//! let labels = MapCache::new(|n: &i32| n.to_string(), items.clone());
//! let out = Sink::new(labels);
//!
//! // An overlapping push recomputes only the elements not seen before.
//! items.set(vec![3, 4, 5, 6]);
//! assert_eq!(*out.dereference(), vec!["3", "4", "5", "6"]);
//! ```

pub mod cache;
pub mod push;
