//! Weak AVL rebalancing.
//!
//! Conventions follow Haeupler, Sen and Tarjan, "Rank-Balanced Trees":
//! - The rank of a node `x` is `r(x)`; missing nodes have rank -1.
//! - A node is an `i`-child if `r(parent) - r(x) == i`.
//! - A node is `i,j` if its children are an `i`-child and a `j`-child.
//!
//! Invariants: every rank difference is 1 or 2, and every leaf has rank 0.
//! Insertion promotes along the path until a promotion would leave a 0-child,
//! at which point one single or double rotation settles everything. Deletion
//! may leave a 3-child or a 2,2 leaf; demotions walk up until a rotation
//! finishes the repair.

use core::ptr::NonNull;

use crate::map::Core;
use crate::node::{self, Dir, Link, Node};
use crate::policy::{Policy, RemoveContext};

/// The weak AVL balancing policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Wavl;

impl Policy for Wavl {
    unsafe fn after_insert<K, V>(&self, core: &mut Core<K, V>, node: NonNull<Node<K, V>>) {
        unsafe {
            let parent = (*node.as_ptr())
                .parent
                .expect("inserted node must have a parent");
            // A parent of positive rank gains the new leaf as a 1- or
            // 2-child and no rank rule is disturbed.
            if (*parent.as_ptr()).meta != 0 {
                return;
            }
            fix_inserted(core, parent);
        }
    }

    unsafe fn after_remove<K, V>(&self, core: &mut Core<K, V>, ctx: RemoveContext<K, V>) {
        unsafe {
            let z = ctx.parent;

            match ctx.replacement {
                Some(x) => {
                    // The removed node was a 2-child iff its child is now
                    // three ranks below the parent.
                    if (*z.as_ptr()).meta - (*x.as_ptr()).meta == 3 {
                        rebalance_3_child(core, z, ctx.side);
                    }
                }
                None if (*z.as_ptr()).is_leaf() => {
                    // The parent was unary (rank 1) and is now a 2,2 leaf.
                    (*z.as_ptr()).meta -= 1;
                    if let Some(p) = (*z.as_ptr()).parent {
                        if (*p.as_ptr()).meta - (*z.as_ptr()).meta == 3 {
                            let side = (*p.as_ptr()).dir_of(z);
                            rebalance_3_child(core, p, side);
                        }
                    }
                }
                None => {
                    if (*z.as_ptr()).meta == 2 {
                        rebalance_3_child(core, z, ctx.side);
                    }
                }
            }
        }
    }

    unsafe fn check_tree<K, V>(&self, root: Link<K, V>) {
        unsafe fn check_at<K, V>(node: NonNull<Node<K, V>>) {
            unsafe {
                let rank = (*node.as_ptr()).meta;
                if (*node.as_ptr()).is_leaf() {
                    assert_eq!(rank, 0, "leaf rank must be 0");
                }

                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = (*node.as_ptr()).child(dir) {
                        let diff = rank - (*child.as_ptr()).meta;
                        assert!((1..=2).contains(&diff), "rank difference must be 1 or 2");
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

// The leaf hung under rank-0 `x` made it a 0-child. Promote and climb;
// rotate when promotion stops being enough.
unsafe fn fix_inserted<K, V>(core: &mut Core<K, V>, mut x: NonNull<Node<K, V>>) {
    unsafe {
        (*x.as_ptr()).meta += 1;

        while let Some(p) = (*x.as_ptr()).parent {
            if (*x.as_ptr()).meta + 1 == (*p.as_ptr()).meta {
                // x is a 1-child again; the rank rule holds everywhere.
                break;
            }

            let side = (*p.as_ptr()).dir_of(x);
            let sibling_gap = (*p.as_ptr()).meta - node::rank((*p.as_ptr()).child(!side));
            if sibling_gap == 2 {
                // Promoting p would leave its sibling side a 3-child, so the
                // repair is a rotation. If x leans toward p (its inner child
                // is the 1-child), the inner child rotates to the top.
                let inner = (*x.as_ptr()).child(!side);
                if (*x.as_ptr()).meta - node::rank(inner) == 1 {
                    let inner = inner.expect("a 1-child is present");
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

// Removal left the `xside` child of `z` three ranks down. Demote toward the
// root while the 3-child violation keeps reappearing, then rotate.
unsafe fn rebalance_3_child<K, V>(core: &mut Core<K, V>, mut z: NonNull<Node<K, V>>, mut xside: Dir) {
    unsafe {
        loop {
            let y = (*z.as_ptr())
                .child(!xside)
                .expect("the sibling of a 3-child cannot be missing");

            if (*z.as_ptr()).meta - (*y.as_ptr()).meta == 2 {
                (*z.as_ptr()).meta -= 1;
            } else if is_2_2(y) {
                (*y.as_ptr()).meta -= 1;
                (*z.as_ptr()).meta -= 1;
            } else {
                // y is a 1-child and not 2,2: one or two rotations repair
                // the tree, with ranks settled by promotes and demotes.
                let outer = (*y.as_ptr()).child(!xside);
                if (*y.as_ptr()).meta - node::rank(outer) == 1 {
                    (*y.as_ptr()).meta += 1;
                    (*z.as_ptr()).meta -= 1;
                    core.rotate_up(y);
                    if (*z.as_ptr()).is_leaf() {
                        (*z.as_ptr()).meta -= 1;
                    }
                } else {
                    let v = (*y.as_ptr())
                        .child(xside)
                        .expect("a non-2,2 sibling has an inner 1-child");
                    (*v.as_ptr()).meta += 2;
                    (*y.as_ptr()).meta -= 1;
                    (*z.as_ptr()).meta -= 2;
                    core.rotate_up(v);
                    core.rotate_up(v);
                }
                return;
            }

            // z was demoted; if it was a 2-child this recreates the 3-child
            // violation one level up.
            let Some(p) = (*z.as_ptr()).parent else { return };
            if (*p.as_ptr()).meta - (*z.as_ptr()).meta != 3 {
                return;
            }
            xside = (*p.as_ptr()).dir_of(z);
            z = p;
        }
    }
}

unsafe fn is_2_2<K, V>(node: NonNull<Node<K, V>>) -> bool {
    unsafe {
        let rank = (*node.as_ptr()).meta;
        rank - node::rank((*node.as_ptr()).left()) == 2
            && rank - node::rank((*node.as_ptr()).right()) == 2
    }
}

#[cfg(test)]
mod tests {
    use crate::WavlMap;

    fn build(keys: &[i32]) -> WavlMap<i32, i32> {
        let mut map = WavlMap::new();
        for &key in keys {
            map.put(key, key);
            map.assert_invariants();
        }
        map
    }

    fn root_key(map: &WavlMap<i32, i32>) -> i32 {
        unsafe { (*map.core.root.unwrap().as_ptr()).key }
    }

    fn rank_of(map: &WavlMap<i32, i32>, key: i32) -> i8 {
        let mut cur = map.core.root;
        unsafe {
            while let Some(node) = cur {
                let node_key = (*node.as_ptr()).key;
                if key == node_key {
                    return (*node.as_ptr()).meta;
                }
                cur = if key < node_key {
                    (*node.as_ptr()).left()
                } else {
                    (*node.as_ptr()).right()
                };
            }
        }
        panic!("key {key} not in tree");
    }

    #[test]
    fn three_ascending_promote_then_rotate() {
        let map = build(&[1, 2, 3]);
        assert_eq!(root_key(&map), 2);
        assert_eq!(rank_of(&map, 2), 1);
        assert_eq!(map.rotations(), 1);
    }

    #[test]
    fn five_ascending() {
        let map = build(&[1, 2, 3, 4, 5]);
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 2);
        assert_eq!(rank_of(&map, 2), 2);
        assert_eq!(rank_of(&map, 4), 1);
        assert_eq!(rank_of(&map, 1), 0);
    }

    #[test]
    fn six_ascending() {
        let map = build(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(map.rotations(), 3);
        assert_eq!(root_key(&map), 4);
        assert_eq!(rank_of(&map, 4), 2);
        assert_eq!(rank_of(&map, 2), 1);
        assert_eq!(rank_of(&map, 5), 1);
    }

    #[test]
    fn five_descending() {
        let map = build(&[5, 4, 3, 2, 1]);
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 4);
        assert_eq!(rank_of(&map, 4), 2);
        assert_eq!(rank_of(&map, 2), 1);
        assert_eq!(rank_of(&map, 5), 0);
    }

    #[test]
    fn double_rotations_count_two() {
        let map = build(&[3, 1, 2]);
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 2);
        assert_eq!(rank_of(&map, 2), 1);

        let map = build(&[3, 6, 4]);
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 4);
        assert_eq!(rank_of(&map, 4), 1);
    }

    const FIBONACCI_SHAPE: [i32; 12] = [8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1];

    #[test]
    fn fibonacci_shape_inserts_without_rotation() {
        let map = build(&FIBONACCI_SHAPE);
        assert_eq!(map.rotations(), 0);
        assert_eq!(root_key(&map), 8);
        assert_eq!(rank_of(&map, 8), 4);
    }

    #[test]
    fn delete_two_child_leaf_rotates_once() {
        let mut map = build(&[10, 8, 12, 6]);
        map.remove(&12);
        map.assert_invariants();
        assert_eq!(map.rotations(), 1);
        assert_eq!(root_key(&map), 8);
        assert_eq!(rank_of(&map, 8), 2);
    }

    #[test]
    fn delete_two_child_leaf_double_rotates() {
        let mut map = build(&[10, 8, 12, 9]);
        map.remove(&12);
        map.assert_invariants();
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 9);
        assert_eq!(rank_of(&map, 9), 2);
    }

    #[test]
    fn delete_only_child_demotes_2_2_leaf() {
        // Removing 4 leaves rank-1 node 3 a leaf; it demotes in place.
        let mut map = build(&[2, 1, 3, 4]);
        map.remove(&4);
        map.assert_invariants();
        assert_eq!(map.rotations(), 0);
        assert_eq!(rank_of(&map, 3), 0);

        // 3 becomes a 2-child leaf; removing 1 then makes it a 3-child and
        // the root demotes.
        map.remove(&1);
        map.assert_invariants();
        assert_eq!(map.rotations(), 0);
        assert_eq!(root_key(&map), 2);
        assert_eq!(rank_of(&map, 2), 1);
    }

    #[test]
    fn delete_everything_both_directions() {
        let mut map = build(&FIBONACCI_SHAPE);
        for key in 1..=12 {
            assert_eq!(map.remove(&key), Some(key));
            map.assert_invariants();
        }
        assert!(map.is_empty());

        let mut map = build(&FIBONACCI_SHAPE);
        for key in (1..=12).rev() {
            assert_eq!(map.remove(&key), Some(key));
            map.assert_invariants();
        }
        assert!(map.is_empty());
    }
}
