//! Relaxed AVL rebalancing.
//!
//! Insertion maintains AVL-shaped ranks the same way the weak AVL policy
//! does, except that rank-difference tests are relaxed: after deletions that
//! skipped rebalancing, gaps larger than 2 are legal, so the promote climb
//! stops at any positive gap and rotations fire only on an actual 0-child.
//! Deletion rebalancing is optional
//! per map; without it deletions are O(1) beyond the splice and ranks only
//! ever drift upward, which keeps searches correct but lets paths lengthen.

use core::ptr::NonNull;

use crate::map::Core;
use crate::node::{self, Dir, Link, Node};
use crate::policy::{Policy, RemoveContext};

/// The relaxed AVL balancing policy.
///
/// `delete_rebalance` selects whether deletions repair ranks; it is off by
/// default.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Ravl {
    pub delete_rebalance: bool,
}

impl Ravl {
    pub const fn new(delete_rebalance: bool) -> Ravl {
        Ravl { delete_rebalance }
    }
}

impl Policy for Ravl {
    unsafe fn after_insert<K, V>(&self, core: &mut Core<K, V>, node: NonNull<Node<K, V>>) {
        unsafe {
            let parent = (*node.as_ptr())
                .parent
                .expect("inserted node must have a parent");
            if (*parent.as_ptr()).meta != 0 {
                return;
            }
            fix_inserted(core, parent);
        }
    }

    unsafe fn after_remove<K, V>(&self, core: &mut Core<K, V>, ctx: RemoveContext<K, V>) {
        if !self.delete_rebalance {
            return;
        }

        unsafe {
            let sibling = (*ctx.parent.as_ptr()).child(!ctx.side);
            // The vacated slot acts as a phantom node one rank below the
            // removed one; a removed leaf leaves rank -1 behind.
            let node_rank = match ctx.replacement {
                Some(x) => (*x.as_ptr()).meta,
                None => ctx.removed_meta - 1,
            };
            fix_removed(core, ctx.parent, sibling, node_rank);
        }
    }

    unsafe fn check_tree<K, V>(&self, root: Link<K, V>) {
        // Without deletion rebalancing leaves keep whatever rank history
        // left them, so only the downhill rank rule is checkable.
        unsafe fn check_at<K, V>(node: NonNull<Node<K, V>>) {
            unsafe {
                let rank = (*node.as_ptr()).meta;
                assert!(rank >= 0, "live nodes have nonnegative rank");

                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = (*node.as_ptr()).child(dir) {
                        assert!(
                            rank > (*child.as_ptr()).meta,
                            "rank must decrease toward the leaves"
                        );
                        check_at(child);
                    }
                }
            }
        }

        if let Some(root) = root {
            unsafe {
                check_at(root);
            }
        }
    }
}

unsafe fn fix_inserted<K, V>(core: &mut Core<K, V>, mut x: NonNull<Node<K, V>>) {
    unsafe {
        (*x.as_ptr()).meta += 1;

        while let Some(p) = (*x.as_ptr()).parent {
            if (*x.as_ptr()).meta < (*p.as_ptr()).meta {
                // Any positive gap is legal here; after unrebalanced
                // deletions the promote can land well below the parent and
                // the climb must not touch the larger gap.
                break;
            }

            let side = (*p.as_ptr()).dir_of(x);
            if needs_rotation(p, !side) {
                // If x's outer child sits 2 or more below, x's growth came
                // through the inner child, which rotates to the top.
                let outer = (*x.as_ptr()).child(side);
                if (*x.as_ptr()).meta - node::rank(outer) >= 2 {
                    let inner = (*x.as_ptr())
                        .child(!side)
                        .expect("promoted node has a child on the grown side");
                    (*x.as_ptr()).meta -= 1;
                    (*inner.as_ptr()).meta += 1;
                    core.rotate_up(inner);
                    (*p.as_ptr()).meta -= 1;
                    core.rotate_up(inner);
                } else {
                    (*p.as_ptr()).meta -= 1;
                    core.rotate_up(x);
                }
                return;
            }

            x = p;
            (*x.as_ptr()).meta += 1;
        }
    }
}

// Whether promoting `p` further is off the table because its `low` side
// already trails by 2 or more.
unsafe fn needs_rotation<K, V>(p: NonNull<Node<K, V>>, low: Dir) -> bool {
    unsafe {
        match (*p.as_ptr()).child(low) {
            None => (*p.as_ptr()).meta >= 1,
            Some(child) => (*p.as_ptr()).meta >= (*child.as_ptr()).meta + 2,
        }
    }
}

// Bottom-up deletion repair: the position below `parent` on the removed
// side stands at `node_rank`, its sibling is `sibling`. Demote while the
// sides are level, rotate off the tall sibling when it leads by two.
unsafe fn fix_removed<K, V>(
    core: &mut Core<K, V>,
    mut parent: NonNull<Node<K, V>>,
    mut sibling: Link<K, V>,
    mut node_rank: i8,
) {
    unsafe {
        loop {
            let balance = node::rank(sibling) - node_rank;
            if balance == 1 {
                // The shortened side was the deep one; ranks hold as-is.
                return;
            }

            if balance == 0 {
                (*parent.as_ptr()).meta -= 1;
            } else {
                let s = sibling.expect("a sibling two ranks up cannot be missing");
                let sside = (*parent.as_ptr()).dir_of(s);
                let inner = (*s.as_ptr()).child(!sside);
                let outer = (*s.as_ptr()).child(sside);

                (*parent.as_ptr()).meta -= 2;
                let lean = node::rank(inner) - node::rank(outer);
                if lean == 0 {
                    // Sibling carries weight on both sides: a single
                    // rotation leaves the subtree at its old rank.
                    (*s.as_ptr()).meta += 1;
                    (*parent.as_ptr()).meta += 1;
                    core.rotate_up(s);
                    return;
                }
                if lean > 0 {
                    let v = inner.expect("leaning sibling has an inner child");
                    (*v.as_ptr()).meta += 1;
                    (*s.as_ptr()).meta -= 1;
                    core.rotate_up(v);
                }
                let up = (*parent.as_ptr())
                    .child(sside)
                    .expect("rotation target is in place");
                core.rotate_up(up);
                parent = up;
            }

            let Some(gp) = (*parent.as_ptr()).parent else { return };
            node_rank = (*parent.as_ptr()).meta;
            let n = parent;
            parent = gp;
            sibling = if (*gp.as_ptr()).left() == Some(n) {
                (*gp.as_ptr()).right()
            } else {
                (*gp.as_ptr()).left()
            };
        }
    }
}
