//! Balance-factor rebalancing.
//!
//! Each node's metadata byte is `height(right) - height(left)`, held in
//! {-1, 0, 1}. Insertion fixups stop after at most one rotation site; a
//! deletion may rotate at several levels on the way up when subtree heights
//! keep shrinking.

use core::ptr::NonNull;

use crate::map::Core;
use crate::node::{Dir, Link, Node};
use crate::policy::{Policy, RemoveContext};

/// The AVL balancing policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Avl;

impl Policy for Avl {
    unsafe fn after_insert<K, V>(&self, core: &mut Core<K, V>, node: NonNull<Node<K, V>>) {
        unsafe {
            let parent = (*node.as_ptr())
                .parent
                .expect("inserted node must have a parent");
            match (*parent.as_ptr()).dir_of(node) {
                Dir::Left => (*parent.as_ptr()).meta -= 1,
                Dir::Right => (*parent.as_ptr()).meta += 1,
            }

            let mut x = parent;
            loop {
                match (*x.as_ptr()).meta {
                    0 => break,
                    2 => {
                        rebalance_grown(core, x, Dir::Right);
                        break;
                    }
                    -2 => {
                        rebalance_grown(core, x, Dir::Left);
                        break;
                    }
                    _ => {
                        // x's subtree grew by one; propagate into the
                        // parent's balance and keep climbing.
                        let Some(p) = (*x.as_ptr()).parent else { break };
                        match (*p.as_ptr()).dir_of(x) {
                            Dir::Left => (*p.as_ptr()).meta -= 1,
                            Dir::Right => (*p.as_ptr()).meta += 1,
                        }
                        x = p;
                    }
                }
            }
        }
    }

    unsafe fn after_remove<K, V>(&self, core: &mut Core<K, V>, ctx: RemoveContext<K, V>) {
        unsafe {
            let parent = ctx.parent;
            match ctx.side {
                Dir::Left => (*parent.as_ptr()).meta += 1,
                Dir::Right => (*parent.as_ptr()).meta -= 1,
            }

            // Going from 0 to +-1 means the parent's height is unchanged and
            // nothing above can notice the removal.
            if matches!((*parent.as_ptr()).meta, 1 | -1) {
                return;
            }
            fix_shrunk(core, parent);
        }
    }

    unsafe fn check_tree<K, V>(&self, root: Link<K, V>) {
        unsafe fn check_at<K, V>(node: NonNull<Node<K, V>>) -> isize {
            unsafe {
                let left = (*node.as_ptr()).left().map_or(-1, |n| check_at(n));
                let right = (*node.as_ptr()).right().map_or(-1, |n| check_at(n));

                let balance = (*node.as_ptr()).meta as isize;
                assert_eq!(balance, right - left, "stored balance factor is stale");
                assert!(balance.abs() <= 1, "balance factor out of range");

                1 + left.max(right)
            }
        }

        if let Some(root) = root {
            unsafe {
                check_at(root);
            }
        }
    }
}

// `x` is +-2 with the taller subtree on `tall` after an insertion. One
// single or double rotation restores every balance on the path.
unsafe fn rebalance_grown<K, V>(core: &mut Core<K, V>, x: NonNull<Node<K, V>>, tall: Dir) {
    unsafe {
        let sign: i8 = match tall {
            Dir::Right => 1,
            Dir::Left => -1,
        };
        let c = (*x.as_ptr())
            .child(tall)
            .expect("a doubly heavy node has a child on the tall side");

        if (*c.as_ptr()).meta == sign {
            (*x.as_ptr()).meta = 0;
            (*c.as_ptr()).meta = 0;
            core.rotate_up(c);
        } else {
            // The tall child leans inward; its inner child comes up over
            // both with its old balance deciding who ends up light.
            let inner = (*c.as_ptr())
                .child(!tall)
                .expect("an inward-leaning child has an inner child");
            let inner_meta = (*inner.as_ptr()).meta;

            (*inner.as_ptr()).meta = 0;
            (*c.as_ptr()).meta = 0;
            (*x.as_ptr()).meta = 0;
            if inner_meta == sign {
                (*x.as_ptr()).meta = -sign;
            } else if inner_meta == -sign {
                (*c.as_ptr()).meta = sign;
            }

            core.rotate_up(inner);
            core.rotate_up(inner);
        }
    }
}

// `x`'s subtree just shrank (balance 0) or went doubly heavy (+-2). Rotate
// and climb for as long as subtree heights keep decreasing.
unsafe fn fix_shrunk<K, V>(core: &mut Core<K, V>, mut x: NonNull<Node<K, V>>) {
    unsafe {
        loop {
            match (*x.as_ptr()).meta {
                2 => match shrink_rotate(core, x, Dir::Right) {
                    Some(subtree) => x = subtree,
                    None => break,
                },
                -2 => match shrink_rotate(core, x, Dir::Left) {
                    Some(subtree) => x = subtree,
                    None => break,
                },
                _ => {}
            }

            let Some(p) = (*x.as_ptr()).parent else { break };
            match (*p.as_ptr()).dir_of(x) {
                Dir::Left => {
                    (*p.as_ptr()).meta += 1;
                    if (*p.as_ptr()).meta == 1 {
                        break;
                    }
                }
                Dir::Right => {
                    (*p.as_ptr()).meta -= 1;
                    if (*p.as_ptr()).meta == -1 {
                        break;
                    }
                }
            }
            x = p;
        }
    }
}

// Rotation step of the deletion fixup at a +-2 node `x` whose taller side is
// `tall`. Returns the new subtree root if the subtree got shorter and the
// climb must continue, `None` if heights are settled.
unsafe fn shrink_rotate<K, V>(
    core: &mut Core<K, V>,
    x: NonNull<Node<K, V>>,
    tall: Dir,
) -> Option<NonNull<Node<K, V>>> {
    unsafe {
        let sign: i8 = match tall {
            Dir::Right => 1,
            Dir::Left => -1,
        };
        let c = (*x.as_ptr())
            .child(tall)
            .expect("a doubly heavy node has a child on the tall side");
        let c_meta = (*c.as_ptr()).meta;

        if c_meta == 0 {
            // The tall child is even: rotating it up leaves the subtree at
            // its old height, so the fixup ends here.
            (*x.as_ptr()).meta = sign;
            (*c.as_ptr()).meta = -sign;
            core.rotate_up(c);
            return None;
        }

        if c_meta == sign {
            (*x.as_ptr()).meta = 0;
            (*c.as_ptr()).meta = 0;
            core.rotate_up(c);
            return Some(c);
        }

        let inner = (*c.as_ptr())
            .child(!tall)
            .expect("an inward-leaning child has an inner child");
        let inner_meta = (*inner.as_ptr()).meta;

        (*inner.as_ptr()).meta = 0;
        (*c.as_ptr()).meta = 0;
        (*x.as_ptr()).meta = 0;
        if inner_meta == sign {
            (*x.as_ptr()).meta = -sign;
        } else if inner_meta == -sign {
            (*c.as_ptr()).meta = sign;
        }

        core.rotate_up(inner);
        core.rotate_up(inner);
        Some(inner)
    }
}

#[cfg(test)]
mod tests {
    use crate::AvlMap;

    fn build(keys: &[i32]) -> AvlMap<i32, i32> {
        let mut map = AvlMap::new();
        for &key in keys {
            map.put(key, key);
            map.assert_invariants();
        }
        map
    }

    fn root_key(map: &AvlMap<i32, i32>) -> i32 {
        unsafe { (*map.core.root.unwrap().as_ptr()).key }
    }

    fn root_meta(map: &AvlMap<i32, i32>) -> i8 {
        unsafe { (*map.core.root.unwrap().as_ptr()).meta }
    }

    #[test]
    fn descending_run_needs_two_rotations() {
        let map = build(&[5, 4, 3, 2, 1]);
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 4);
        // Left subtree holds three of five keys, so the root stays left
        // heavy after the second (deeper) rotation.
        assert_eq!(root_meta(&map), -1);
    }

    #[test]
    fn ascending_run_needs_two_rotations() {
        let map = build(&[1, 2, 3, 4, 5]);
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 2);
        assert_eq!(root_meta(&map), 1);
    }

    #[test]
    fn double_rotation_counts_two() {
        let map = build(&[3, 1, 2]);
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 2);
        assert_eq!(root_meta(&map), 0);

        let map = build(&[3, 6, 4]);
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 4);
        assert_eq!(root_meta(&map), 0);
    }

    // A tree of minimum size for its height: every deletion-driven height
    // change propagates.
    const FIBONACCI_SHAPE: [i32; 12] = [8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1];

    #[test]
    fn fibonacci_shape_inserts_without_rotation() {
        let map = build(&FIBONACCI_SHAPE);
        assert_eq!(map.rotations(), 0);
        assert_eq!(root_key(&map), 8);
    }

    #[test]
    fn delete_from_fibonacci_shape_cascades() {
        let mut map = build(&FIBONACCI_SHAPE);
        map.remove(&12);
        map.assert_invariants();
        assert_eq!(map.rotations(), 2);
        assert_eq!(root_key(&map), 5);
    }

    #[test]
    fn delete_leaf_triggers_double_rotation() {
        let mut map = build(&[10, 8, 12, 9]);
        map.remove(&12);
        map.assert_invariants();
        assert_eq!(root_key(&map), 9);
        assert_eq!(root_meta(&map), 0);
        assert_eq!(map.rotations(), 2);
    }

    #[test]
    fn delete_interior_splices_successor() {
        let mut map = build(&[5, 3, 8, 2, 4, 7, 9, 6]);
        assert_eq!(map.remove(&5), Some(5));
        map.assert_invariants();
        assert_eq!(map.get(&6), Some(&6));
        assert_eq!(map.len(), 7);
        let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, [2, 3, 4, 6, 7, 8, 9]);
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
