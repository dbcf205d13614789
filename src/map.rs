use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::cmp::{Compare, Natural};
use crate::cursor::Cursor;
use crate::iter::Iter;
use crate::node::{self, Dir, Link, Node};
use crate::policy::{Policy, RemoveContext};
use crate::{Avl, Ravl, Wavl};

/// An ordered map backed by a self-balancing binary search tree.
///
/// The balancing strategy is the type parameter `P`; see [`Avl`], [`Wavl`]
/// and [`Ravl`]. All strategies share this engine: a tree with parent
/// pointers, iterative fixups, and deletion by splicing the in-order
/// successor into the removed slot. The key order is supplied by `C`,
/// defaulting to [`Natural`] (the key type's [`Ord`]).
pub struct TreeMap<K, V, P, C = Natural>
where
    P: Policy,
{
    pub(crate) core: Core<K, V>,
    policy: P,
    cmp: C,
    marker: PhantomData<Box<Node<K, V>>>,
}

/// An AVL map: each node carries its balance factor,
/// `height(right) - height(left)`, kept in `{-1, 0, 1}`.
pub type AvlMap<K, V, C = Natural> = TreeMap<K, V, Avl, C>;

/// A weak AVL map: each node carries a rank; leaves have rank 0 and
/// parent-child rank differences are 1 or 2.
pub type WavlMap<K, V, C = Natural> = TreeMap<K, V, Wavl, C>;

/// A relaxed AVL map: ranks as in [`WavlMap`], but deletions rebalance only
/// when the map was built with [`Ravl::new`]`(true)`.
pub type RavlMap<K, V, C = Natural> = TreeMap<K, V, Ravl, C>;

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(0);

/// The structural state of a tree, shared between the engine and the
/// balancing policies.
#[doc(hidden)]
pub struct Core<K, V> {
    pub(crate) root: Link<K, V>,
    pub(crate) size: usize,
    /// Bumped on every structural mutation. Detached cursors fail fast by
    /// comparing against it; value-only replacement leaves it alone.
    pub(crate) generation: u64,
    /// Single rotations performed since creation (a double rotation counts
    /// as two). Diagnostic; reset by `clear`.
    pub(crate) rotations: u64,
    /// Identity of the owning map, used to bind cursors to it.
    pub(crate) id: u64,
}

impl<K, V> Core<K, V> {
    fn new() -> Core<K, V> {
        Core {
            root: None,
            size: 0,
            generation: 0,
            rotations: 0,
            id: NEXT_MAP_ID.fetch_add(1, AtomicOrdering::Relaxed),
        }
    }

    pub(crate) fn first_node(&self) -> Link<K, V> {
        self.extremum(Dir::Left)
    }

    pub(crate) fn last_node(&self) -> Link<K, V> {
        self.extremum(Dir::Right)
    }

    fn extremum(&self, dir: Dir) -> Link<K, V> {
        let mut cur = self.root?;
        unsafe {
            while let Some(next) = (*cur.as_ptr()).child(dir) {
                cur = next;
            }
        }
        Some(cur)
    }

    /// Rotates `up` into its parent's place, moving the parent down.
    ///
    /// Metadata is not touched; the calling policy owns the rank or balance
    /// updates. Counts one rotation.
    ///
    /// # Safety
    ///
    /// `up` must be a non-root node of this tree.
    pub(crate) unsafe fn rotate_up(&mut self, up: NonNull<Node<K, V>>) {
        unsafe {
            let down = (*up.as_ptr())
                .parent
                .expect("rotation requires a parent to rotate over");
            // `down` becomes the `dir` child of `up`, and `up`'s former
            // `dir` child moves across to `down`'s vacated slot.
            let dir = if (*down.as_ptr()).right() == Some(up) {
                Dir::Left
            } else {
                Dir::Right
            };

            let across = (*up.as_ptr()).child(dir);
            (*down.as_ptr()).set_child(!dir, across);
            if let Some(across) = across {
                (*across.as_ptr()).parent = Some(down);
            }

            let parent = (*down.as_ptr()).parent;
            (*up.as_ptr()).set_child(dir, Some(down));
            (*down.as_ptr()).parent = Some(up);
            (*up.as_ptr()).parent = parent;

            match parent {
                Some(parent) => {
                    let slot = (*parent.as_ptr()).dir_of(down);
                    (*parent.as_ptr()).set_child(slot, Some(up));
                }
                None => self.root = Some(up),
            }

            self.rotations += 1;
        }
    }
}

impl<K, V, P> TreeMap<K, V, P>
where
    P: Policy + Default,
{
    /// Returns a new empty map ordered by the key type's [`Ord`].
    pub fn new() -> TreeMap<K, V, P> {
        TreeMap::with_policy_and_comparator(P::default(), Natural)
    }
}

impl<K, V, P, C> TreeMap<K, V, P, C>
where
    P: Policy,
{
    /// Returns a new empty map ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> TreeMap<K, V, P, C>
    where
        P: Default,
    {
        TreeMap::with_policy_and_comparator(P::default(), cmp)
    }

    /// Returns a new empty map with an explicitly configured policy.
    ///
    /// Only [`Ravl`] carries configuration; the other policies are unit
    /// values.
    pub fn with_policy(policy: P) -> TreeMap<K, V, P, C>
    where
        C: Default,
    {
        TreeMap::with_policy_and_comparator(policy, C::default())
    }

    pub fn with_policy_and_comparator(policy: P, cmp: C) -> TreeMap<K, V, P, C> {
        TreeMap {
            core: Core::new(),
            policy,
            cmp,
            marker: PhantomData,
        }
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.core.size
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.core.size == 0
    }

    /// Returns the number of single rotations performed since the map was
    /// created or last cleared. A double rotation counts as two.
    pub fn rotations(&self) -> u64 {
        self.core.rotations
    }

    /// Returns the height of the tree in edges, or `None` when empty.
    pub fn height(&self) -> Option<usize> {
        unsafe fn height_at<K, V>(node: NonNull<Node<K, V>>) -> usize {
            unsafe {
                let left = (*node.as_ptr()).left().map_or(0, |n| 1 + height_at(n));
                let right = (*node.as_ptr()).right().map_or(0, |n| 1 + height_at(n));
                left.max(right)
            }
        }

        self.core.root.map(|root| unsafe { height_at(root) })
    }

    /// Removes every entry, resetting the rotation counter.
    ///
    /// Live cursors observe this as a structural mutation.
    pub fn clear(&mut self) {
        // Post-order teardown through the parent pointers; no recursion, no
        // auxiliary storage.
        unsafe {
            let mut cur = self.core.root.take();
            while let Some(node) = cur {
                if let Some(left) = (*node.as_ptr()).left() {
                    cur = Some(left);
                    continue;
                }
                if let Some(right) = (*node.as_ptr()).right() {
                    cur = Some(right);
                    continue;
                }

                let parent = (*node.as_ptr()).parent;
                if let Some(parent) = parent {
                    let slot = (*parent.as_ptr()).dir_of(node);
                    (*parent.as_ptr()).set_child(slot, None);
                }
                drop(Node::into_box(node));
                cur = parent;
            }
        }

        self.core.size = 0;
        self.core.rotations = 0;
        self.core.generation += 1;
    }

    fn find<Q>(&self, key: &Q) -> Link<K, V>
    where
        Q: ?Sized,
        C: Compare<Q, K>,
    {
        let mut cur = self.core.root;
        while let Some(node) = cur {
            let node_ref = unsafe { node.as_ref() };
            cur = match self.cmp.compare(key, &node_ref.key) {
                Ordering::Less => node_ref.left(),
                Ordering::Greater => node_ref.right(),
                Ordering::Equal => return Some(node),
            };
        }
        None
    }

    /// Returns a reference to the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized,
        C: Compare<Q, K>,
    {
        self.find(key).map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized,
        C: Compare<Q, K>,
    {
        self.find(key).map(|node| unsafe { &mut (*node.as_ptr()).value })
    }

    /// Returns `true` if the map contains an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized,
        C: Compare<Q, K>,
    {
        self.find(key).is_some()
    }

    /// Inserts `key`/`value`, returning the previous value if `key` was
    /// already present.
    ///
    /// Replacing a value is not a structural mutation: the tree shape and
    /// any live cursors are unaffected.
    pub fn put(&mut self, key: K, value: V) -> Option<V>
    where
        C: Compare<K>,
    {
        let mut parent = None;
        let mut side = Dir::Left;
        let mut cur = self.core.root;

        while let Some(node) = cur {
            let node_ref = unsafe { node.as_ref() };
            match self.cmp.compare(&key, &node_ref.key) {
                Ordering::Less => {
                    parent = Some(node);
                    side = Dir::Left;
                    cur = node_ref.left();
                }
                Ordering::Greater => {
                    parent = Some(node);
                    side = Dir::Right;
                    cur = node_ref.right();
                }
                Ordering::Equal => {
                    return Some(unsafe { mem::replace(&mut (*node.as_ptr()).value, value) });
                }
            }
        }

        let new = Node::new_ptr(key, value, parent);
        match parent {
            Some(parent) => unsafe { (*parent.as_ptr()).set_child(side, Some(new)) },
            None => self.core.root = Some(new),
        }
        self.core.size += 1;
        self.core.generation += 1;

        if parent.is_some() {
            unsafe { self.policy.after_insert(&mut self.core, new) };
        }
        None
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized,
        C: Compare<Q, K>,
    {
        let node = self.find(key)?;
        Some(unsafe { self.remove_node(node) }.1)
    }

    /// Unlinks `target`, frees it, and lets the policy repair balance.
    /// Returns the removed entry.
    ///
    /// # Safety
    ///
    /// `target` must be a live node of this map.
    pub(crate) unsafe fn remove_node(&mut self, target: NonNull<Node<K, V>>) -> (K, V) {
        unsafe {
            self.core.generation += 1;
            self.core.size -= 1;

            let mut target = target;
            if (*target.as_ptr()).left().is_some() && (*target.as_ptr()).right().is_some() {
                // Interior node: its successor holds the next-larger key and
                // has no left child. Trade entries with it and unlink the
                // successor instead, reducing to the one-child case.
                let succ =
                    node::successor(target).expect("a node with a right child has a successor");
                mem::swap(&mut (*target.as_ptr()).key, &mut (*succ.as_ptr()).key);
                mem::swap(&mut (*target.as_ptr()).value, &mut (*succ.as_ptr()).value);
                target = succ;
            }

            let replacement = (*target.as_ptr()).left().or((*target.as_ptr()).right());
            let parent = (*target.as_ptr()).parent;

            match parent {
                Some(parent_ptr) => {
                    let side = (*parent_ptr.as_ptr()).dir_of(target);
                    (*parent_ptr.as_ptr()).set_child(side, replacement);
                    if let Some(replacement) = replacement {
                        (*replacement.as_ptr()).parent = Some(parent_ptr);
                    }

                    let removed_meta = (*target.as_ptr()).meta;
                    let boxed = *Node::into_box(target);
                    self.policy.after_remove(
                        &mut self.core,
                        RemoveContext {
                            parent: parent_ptr,
                            side,
                            replacement,
                            removed_meta,
                        },
                    );
                    (boxed.key, boxed.value)
                }
                None => {
                    // Removing the root with at most one child leaves a tree
                    // of at most one node; nothing to rebalance.
                    self.core.root = replacement;
                    if let Some(replacement) = replacement {
                        (*replacement.as_ptr()).parent = None;
                    }
                    let boxed = *Node::into_box(target);
                    (boxed.key, boxed.value)
                }
            }
        }
    }

    /// Returns the entry with the smallest key.
    pub fn first_entry(&self) -> Option<(&K, &V)> {
        self.core.first_node().map(|node| unsafe { entry_ref(node) })
    }

    /// Returns the entry with the largest key.
    pub fn last_entry(&self) -> Option<(&K, &V)> {
        self.core.last_node().map(|node| unsafe { entry_ref(node) })
    }

    /// Removes and returns the entry with the smallest key.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let node = self.core.first_node()?;
        Some(unsafe { self.remove_node(node) })
    }

    /// Removes and returns the entry with the largest key.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let node = self.core.last_node()?;
        Some(unsafe { self.remove_node(node) })
    }

    /// Returns the in-order successor of the entry with exactly `key`, or
    /// `None` if `key` is absent or last.
    pub fn successor<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: ?Sized,
        C: Compare<Q, K>,
    {
        let node = self.find(key)?;
        unsafe { node::successor(node).map(|next| entry_ref(next)) }
    }

    /// Returns the in-order predecessor of the entry with exactly `key`, or
    /// `None` if `key` is absent or first.
    pub fn predecessor<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: ?Sized,
        C: Compare<Q, K>,
    {
        let node = self.find(key)?;
        unsafe { node::predecessor(node).map(|prev| entry_ref(prev)) }
    }

    /// Returns a borrowed iterator over the entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.core.first_node(), self.core.size)
    }

    /// Returns a detached fail-fast cursor positioned before the first
    /// entry.
    ///
    /// Unlike [`TreeMap::iter`], a cursor holds no borrow of the map between
    /// steps; structural mutations it did not make itself are reported as
    /// [`crate::Error::ConcurrentMutation`] on the next step.
    pub fn cursor(&self) -> Cursor<K, V> {
        Cursor::new(self.core.id, self.core.generation, self.core.first_node())
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        C: Compare<K>,
    {
        let mut count = 0;
        if let Some(root) = self.core.root {
            unsafe {
                assert!((*root.as_ptr()).parent.is_none(), "root has a parent");
                self.assert_invariants_at(root, &mut count);
                self.policy.check_tree(self.core.root);
            }
        }
        assert_eq!(count, self.core.size, "node count does not match size");
    }

    unsafe fn assert_invariants_at(&self, node: NonNull<Node<K, V>>, count: &mut usize)
    where
        C: Compare<K>,
    {
        unsafe {
            *count += 1;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = (*node.as_ptr()).child(dir) {
                    assert_eq!(
                        (*child.as_ptr()).parent,
                        Some(node),
                        "child's parent pointer does not point at its parent"
                    );

                    let expected = match dir {
                        Dir::Left => Ordering::Less,
                        Dir::Right => Ordering::Greater,
                    };
                    let actual = self.cmp.compare(&(*child.as_ptr()).key, &(*node.as_ptr()).key);
                    assert_eq!(actual, expected, "search order violated");

                    self.assert_invariants_at(child, count);
                }
            }
        }
    }
}

unsafe fn entry_ref<'a, K, V>(node: NonNull<Node<K, V>>) -> (&'a K, &'a V) {
    unsafe { (&(*node.as_ptr()).key, &(*node.as_ptr()).value) }
}

impl<K, V, P, C> Drop for TreeMap<K, V, P, C>
where
    P: Policy,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V, P, C> Default for TreeMap<K, V, P, C>
where
    P: Policy + Default,
    C: Default,
{
    fn default() -> TreeMap<K, V, P, C> {
        TreeMap::with_policy_and_comparator(P::default(), C::default())
    }
}

impl<K, V, P, C> fmt::Debug for TreeMap<K, V, P, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    P: Policy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, P, C> Extend<(K, V)> for TreeMap<K, V, P, C>
where
    P: Policy,
    C: Compare<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl<K, V, P, C> FromIterator<(K, V)> for TreeMap<K, V, P, C>
where
    P: Policy + Default,
    C: Compare<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> TreeMap<K, V, P, C> {
        let mut map = TreeMap::default();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, P, C> IntoIterator for &'a TreeMap<K, V, P, C>
where
    P: Policy,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
