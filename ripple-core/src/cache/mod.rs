//! Result Memoization
//!
//! The memo table and equality policies behind [`crate::push::MapCache`].
//! A table maps elements to previously computed results under a pluggable
//! equality/hash pair, so "same element" can mean whatever the caller
//! needs it to mean.
//!
//! The table lives here rather than inside the node so it can be reasoned
//! about (and tested) as a plain data structure, independent of push
//! mechanics.

mod policy;
mod table;

pub use policy::{ElementEq, ElementHash, EqBy, HashBy, Natural};
pub use table::ElementCache;
