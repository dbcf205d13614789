//! Ordered, in-memory key-value maps over self-balancing binary search
//! trees.
//!
//! One engine, three balancing policies sharing it:
//!
//! - [`AvlMap`]: classic AVL, one balance factor byte per node.
//! - [`WavlMap`]: weak AVL after Haeupler, Sen and Tarjan, one rank byte
//!   per node. Insert-only workloads produce exactly the AVL shape; deletion
//!   does strictly less restructuring work.
//! - [`RavlMap`]: relaxed AVL. Insertions balance like WAVL; deletion
//!   rebalancing is optional per map and off by default, trading longer
//!   paths for constant-time splices.
//!
//! The engine keeps parent pointers on every node, so all fixups are
//! iterative and iteration needs no stack or recursion. Deleting an interior
//! entry splices its in-order successor into place, exactly like the classic
//! binary-search-tree deletion. Every map counts its rotations, which makes
//! the restructuring behavior of the policies directly observable:
//!
//! ```
//! use bbst::{AvlMap, WavlMap};
//!
//! let mut avl = AvlMap::new();
//! let mut wavl = WavlMap::new();
//! for key in [8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1] {
//!     avl.put(key, ());
//!     wavl.put(key, ());
//! }
//! // This insertion order grows both trees without any restructuring.
//! assert_eq!(avl.rotations(), 0);
//! assert_eq!(wavl.rotations(), 0);
//! assert_eq!(avl.first_entry(), Some((&1, &())));
//! assert_eq!(avl.successor(&7), Some((&8, &())));
//! ```
//!
//! Traversal interleaved with mutation goes through [`Cursor`], which is
//! detached from the borrow of the map and fails fast with
//! [`Error::ConcurrentMutation`] when it observes a structural change it
//! did not make itself.

use core::fmt;

mod avl;
mod cmp;
mod cursor;
mod iter;
mod map;
mod node;
mod policy;
mod ravl;
pub mod replay;
mod wavl;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use crate::avl::Avl;
pub use crate::cmp::{Compare, FnCmp, Natural};
pub use crate::cursor::Cursor;
pub use crate::iter::Iter;
pub use crate::map::{AvlMap, RavlMap, TreeMap, WavlMap};
pub use crate::policy::Policy;
pub use crate::ravl::Ravl;
pub use crate::wavl::Wavl;

/// Errors surfaced by map traversal and workload replay.
///
/// Violations of the trees' internal invariants are bugs, not recoverable
/// conditions, and panic instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A [`Cursor`] observed a structural mutation it did not make.
    ConcurrentMutation,
    /// A replayed token could not be parsed as a key.
    InvalidKey(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConcurrentMutation => {
                write!(f, "map was structurally mutated behind a live cursor")
            }
            Error::InvalidKey(token) => write!(f, "invalid key in replayed input: {token:?}"),
        }
    }
}

impl std::error::Error for Error {}
