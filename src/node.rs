use core::{ops::Not, ptr::NonNull};

pub type Link<K, V> = Option<NonNull<Node<K, V>>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// A tree node, owned by its map and linked with raw parent/child pointers.
///
/// `meta` is the balancing metadata byte: the balance factor under the AVL
/// policy, the rank under the WAVL and RAVL policies.
pub struct Node<K, V> {
    pub(crate) parent: Link<K, V>,
    pub(crate) children: [Link<K, V>; 2],
    pub(crate) meta: i8,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Node<K, V> {
    /// Allocates a new leaf. New leaves start at metadata 0 under every
    /// policy: balance factor 0 for AVL, rank 0 for WAVL and RAVL.
    pub(crate) fn new_ptr(key: K, value: V, parent: Link<K, V>) -> NonNull<Node<K, V>> {
        NonNull::from(Box::leak(Box::new(Node {
            parent,
            children: [None, None],
            meta: 0,
            key,
            value,
        })))
    }

    /// Reclaims ownership of a node previously allocated by [`Node::new_ptr`].
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`Node::new_ptr`] and must not be
    /// reachable from any tree afterwards.
    pub(crate) unsafe fn into_box(ptr: NonNull<Node<K, V>>) -> Box<Node<K, V>> {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    pub(crate) fn child(&self, dir: Dir) -> Link<K, V> {
        self.children[dir as usize]
    }

    pub(crate) fn set_child(&mut self, dir: Dir, child: Link<K, V>) {
        self.children[dir as usize] = child;
    }

    pub(crate) fn left(&self) -> Link<K, V> {
        self.child(Dir::Left)
    }

    pub(crate) fn right(&self) -> Link<K, V> {
        self.child(Dir::Right)
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    // Which child slot of `self` holds `child`. The caller must ensure
    // `child` actually is a child of `self`.
    pub(crate) fn dir_of(&self, child: NonNull<Node<K, V>>) -> Dir {
        if self.left() == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

/// Rank of a possibly missing node. Missing nodes have rank -1.
pub(crate) unsafe fn rank<K, V>(link: Link<K, V>) -> i8 {
    match link {
        Some(node) => unsafe { (*node.as_ptr()).meta },
        None => -1,
    }
}

/// In-order successor: leftmost node of the right subtree, or the nearest
/// ancestor of which `node` lies in the left subtree.
///
/// # Safety
///
/// `node` must point to a live node of a well-formed tree.
pub(crate) unsafe fn successor<K, V>(node: NonNull<Node<K, V>>) -> Link<K, V> {
    unsafe { neighbor(node, Dir::Right) }
}

/// In-order predecessor; the mirror image of [`successor`].
///
/// # Safety
///
/// `node` must point to a live node of a well-formed tree.
pub(crate) unsafe fn predecessor<K, V>(node: NonNull<Node<K, V>>) -> Link<K, V> {
    unsafe { neighbor(node, Dir::Left) }
}

unsafe fn neighbor<K, V>(node: NonNull<Node<K, V>>, dir: Dir) -> Link<K, V> {
    unsafe {
        if let Some(subtree) = (*node.as_ptr()).child(dir) {
            let mut cur = subtree;
            while let Some(next) = (*cur.as_ptr()).child(!dir) {
                cur = next;
            }
            return Some(cur);
        }

        let mut child = node;
        let mut parent = (*node.as_ptr()).parent;
        while let Some(p) = parent {
            if (*p.as_ptr()).child(dir) != Some(child) {
                break;
            }
            child = p;
            parent = (*p.as_ptr()).parent;
        }
        parent
    }
}
