//! The seam between the tree engine and the balancing strategies.
//!
//! The engine in [`crate::map`] performs the structural work shared by every
//! strategy: search, linking a new leaf, the successor splice on deletion,
//! and the rotation primitives. A [`Policy`] supplies what differs: how the
//! per-node metadata byte is interpreted and repaired after each mutation.

use core::ptr::NonNull;

use crate::map::Core;
use crate::node::{Dir, Link, Node};

/// What the engine knows at the moment a node has been unlinked.
///
/// The physically removed node always had at most one child: interior
/// removals are reduced to this case by splicing the in-order successor's
/// key and value into the target node first.
#[doc(hidden)]
pub struct RemoveContext<K, V> {
    /// Parent of the removed node. Root removals never need rebalancing and
    /// do not reach the policy.
    pub parent: NonNull<Node<K, V>>,
    /// Which side of `parent` the removed node hung on.
    pub side: Dir,
    /// The removed node's single child, now at its place under `parent`.
    pub replacement: Link<K, V>,
    /// Metadata byte of the removed node.
    pub removed_meta: i8,
}

/// A rebalancing strategy for [`crate::TreeMap`].
///
/// Implemented by [`crate::Avl`], [`crate::Wavl`] and [`crate::Ravl`]. The
/// hook methods are not meant to be called (or implemented) outside this
/// crate.
pub trait Policy {
    /// Repairs balance after `node` was linked as a new leaf.
    ///
    /// Not called when `node` became the root.
    ///
    /// # Safety
    ///
    /// `node` must be a freshly inserted leaf of the tree rooted in `core`,
    /// with its parent link set.
    #[doc(hidden)]
    unsafe fn after_insert<K, V>(&self, core: &mut Core<K, V>, node: NonNull<Node<K, V>>);

    /// Repairs balance after a node was unlinked.
    ///
    /// # Safety
    ///
    /// `ctx` must describe a splice that just happened in the tree rooted in
    /// `core`.
    #[doc(hidden)]
    unsafe fn after_remove<K, V>(&self, core: &mut Core<K, V>, ctx: RemoveContext<K, V>);

    /// Panics unless the metadata of every node satisfies this policy's
    /// balance rule. Structural checks (ordering, parent links, size) are the
    /// engine's job.
    ///
    /// # Safety
    ///
    /// `root` must be the root of a structurally well-formed tree.
    #[doc(hidden)]
    unsafe fn check_tree<K, V>(&self, root: Link<K, V>);
}
