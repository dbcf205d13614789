extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model;

use super::*;

fn insert_find_all<P: Policy>(policy: P, keys: &[u32]) {
    let mut map: TreeMap<u32, u32, P> = TreeMap::with_policy(policy);

    for &key in keys {
        map.put(key, key);
        map.assert_invariants();
    }

    for &key in keys {
        assert_eq!(map.get(&key), Some(&key), "key {key} not found");
    }
}

fn insert_find_all_policies(keys: &[u32]) {
    insert_find_all(Avl, keys);
    insert_find_all(Wavl, keys);
    insert_find_all(Ravl::new(false), keys);
    insert_find_all(Ravl::new(true), keys);
}

#[test]
fn zero_elems_find() {
    insert_find_all_policies(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all_policies(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all_policies(&[0, 1]);
    insert_find_all_policies(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all_policies(&[0, 1, 2]);
    insert_find_all_policies(&[0, 2, 1]);
    insert_find_all_policies(&[1, 0, 2]);
    insert_find_all_policies(&[1, 2, 0]);
    insert_find_all_policies(&[2, 0, 1]);
    insert_find_all_policies(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all_policies(&[0, 1, 2, 3]);
    insert_find_all_policies(&[0, 1, 3, 2]);
    insert_find_all_policies(&[0, 2, 1, 3]);
    insert_find_all_policies(&[0, 2, 3, 1]);
    insert_find_all_policies(&[0, 3, 1, 2]);
    insert_find_all_policies(&[0, 3, 2, 1]);

    insert_find_all_policies(&[1, 0, 2, 3]);
    insert_find_all_policies(&[1, 0, 3, 2]);
    insert_find_all_policies(&[1, 2, 0, 3]);
    insert_find_all_policies(&[1, 2, 3, 0]);
    insert_find_all_policies(&[1, 3, 0, 2]);
    insert_find_all_policies(&[1, 3, 2, 0]);

    insert_find_all_policies(&[2, 0, 1, 3]);
    insert_find_all_policies(&[2, 0, 3, 1]);
    insert_find_all_policies(&[2, 1, 0, 3]);
    insert_find_all_policies(&[2, 1, 3, 0]);
    insert_find_all_policies(&[2, 3, 0, 1]);
    insert_find_all_policies(&[2, 3, 1, 0]);

    insert_find_all_policies(&[3, 0, 1, 2]);
    insert_find_all_policies(&[3, 0, 2, 1]);
    insert_find_all_policies(&[3, 1, 0, 2]);
    insert_find_all_policies(&[3, 1, 2, 0]);
    insert_find_all_policies(&[3, 2, 0, 1]);
    insert_find_all_policies(&[3, 2, 1, 0]);
}

fn insert_remove_all<P: Policy>(policy: P, keys: &[u32]) {
    let mut map: TreeMap<u32, u32, P> = TreeMap::with_policy(policy);

    for &key in keys {
        map.put(key, key);
        map.assert_invariants();
    }

    for &key in keys {
        assert_eq!(map.remove(&key), Some(key), "key {key} not found");
        map.assert_invariants();
    }

    for &key in keys {
        map.put(key, key);
        map.assert_invariants();
    }

    for &key in keys.iter().rev() {
        assert_eq!(map.remove(&key), Some(key), "key {key} not found");
        map.assert_invariants();
    }

    assert!(map.is_empty());
}

fn insert_remove_all_policies(keys: &[u32]) {
    insert_remove_all(Avl, keys);
    insert_remove_all(Wavl, keys);
    insert_remove_all(Ravl::new(false), keys);
    insert_remove_all(Ravl::new(true), keys);
}

#[test]
fn remove_one() {
    insert_remove_all_policies(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all_policies(&[0, 1]);
    insert_remove_all_policies(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all_policies(&[0, 1, 2]);
    insert_remove_all_policies(&[0, 2, 1]);
    insert_remove_all_policies(&[1, 0, 2]);
    insert_remove_all_policies(&[1, 2, 0]);
    insert_remove_all_policies(&[2, 0, 1]);
    insert_remove_all_policies(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    insert_remove_all_policies(&[0, 1, 2, 3]);
    insert_remove_all_policies(&[0, 1, 3, 2]);
    insert_remove_all_policies(&[0, 2, 1, 3]);
    insert_remove_all_policies(&[0, 2, 3, 1]);
    insert_remove_all_policies(&[0, 3, 1, 2]);
    insert_remove_all_policies(&[0, 3, 2, 1]);

    insert_remove_all_policies(&[1, 0, 2, 3]);
    insert_remove_all_policies(&[1, 0, 3, 2]);
    insert_remove_all_policies(&[1, 2, 0, 3]);
    insert_remove_all_policies(&[1, 2, 3, 0]);
    insert_remove_all_policies(&[1, 3, 0, 2]);
    insert_remove_all_policies(&[1, 3, 2, 0]);

    insert_remove_all_policies(&[2, 0, 1, 3]);
    insert_remove_all_policies(&[2, 0, 3, 1]);
    insert_remove_all_policies(&[2, 1, 0, 3]);
    insert_remove_all_policies(&[2, 1, 3, 0]);
    insert_remove_all_policies(&[2, 3, 0, 1]);
    insert_remove_all_policies(&[2, 3, 1, 0]);

    insert_remove_all_policies(&[3, 0, 1, 2]);
    insert_remove_all_policies(&[3, 0, 2, 1]);
    insert_remove_all_policies(&[3, 1, 0, 2]);
    insert_remove_all_policies(&[3, 1, 2, 0]);
    insert_remove_all_policies(&[3, 2, 0, 1]);
    insert_remove_all_policies(&[3, 2, 1, 0]);
}

#[test]
fn put_replaces_value() {
    let mut map: WavlMap<u32, &str> = WavlMap::new();

    assert_eq!(map.put(1, "one"), None);
    assert_eq!(map.put(1, "uno"), Some("one"));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&1), Some(&"uno"));
}

#[test]
fn get_mut_updates_in_place() {
    let mut map: AvlMap<u32, u32> = AvlMap::new();
    map.put(7, 0);

    *map.get_mut(&7).unwrap() += 5;
    assert_eq!(map.get(&7), Some(&5));
    assert_eq!(map.get_mut(&8), None);
}

#[test]
fn iter_is_sorted_and_sized() {
    let mut map: AvlMap<u32, u32> = AvlMap::new();
    for key in [5, 1, 9, 3, 7, 2, 8] {
        map.put(key, key * 10);
    }

    let mut iter = map.iter();
    assert_eq!(iter.size_hint(), (7, Some(7)));
    assert_eq!(iter.next(), Some((&1, &10)));
    assert_eq!(iter.len(), 6);

    let rest: Vec<u32> = iter.map(|(&k, _)| k).collect();
    assert_eq!(rest, [2, 3, 5, 7, 8, 9]);
}

#[test]
fn first_last_and_pops() {
    let mut map: WavlMap<u32, u32> = (1..=5).map(|k| (k, k)).collect();

    assert_eq!(map.first_entry(), Some((&1, &1)));
    assert_eq!(map.last_entry(), Some((&5, &5)));
    assert_eq!(map.pop_first(), Some((1, 1)));
    assert_eq!(map.pop_last(), Some((5, 5)));
    map.assert_invariants();
    assert_eq!(map.len(), 3);

    map.clear();
    assert_eq!(map.first_entry(), None);
    assert_eq!(map.pop_first(), None);
    assert_eq!(map.pop_last(), None);
}

#[test]
fn successor_and_predecessor() {
    let map: AvlMap<u32, u32> = [10, 20, 30].into_iter().map(|k| (k, k)).collect();

    assert_eq!(map.successor(&10), Some((&20, &20)));
    assert_eq!(map.successor(&30), None);
    assert_eq!(map.predecessor(&20), Some((&10, &10)));
    assert_eq!(map.predecessor(&10), None);

    // The key must be present exactly; near misses are not resolved.
    assert_eq!(map.successor(&15), None);
    assert_eq!(map.predecessor(&25), None);
}

#[test]
fn clear_resets_rotations() {
    let mut map: AvlMap<u32, u32> = AvlMap::new();
    for key in 0..32 {
        map.put(key, key);
    }
    assert_ne!(map.rotations(), 0);

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.rotations(), 0);
    assert_eq!(map.height(), None);
}

#[test]
fn borrowed_key_lookup() {
    let mut map: WavlMap<String, u32> = WavlMap::new();
    map.put(String::from("alpha"), 1);
    map.put(String::from("beta"), 2);

    assert_eq!(map.get("beta"), Some(&2));
    assert!(map.contains_key("alpha"));
    assert!(!map.contains_key("gamma"));
}

#[test]
fn custom_comparator_reverses_order() {
    let cmp = FnCmp(|a: &u32, b: &u32| b.cmp(a));
    let mut map: AvlMap<u32, u32, _> = AvlMap::with_comparator(cmp);
    for key in [2, 5, 1, 4, 3] {
        map.put(key, key);
        map.assert_invariants();
    }

    let keys: Vec<u32> = map.iter().map(|(&k, _)| k).collect();
    assert_eq!(keys, [5, 4, 3, 2, 1]);
    assert_eq!(map.first_entry(), Some((&5, &5)));
    assert_eq!(map.remove(&4), Some(4));
    map.assert_invariants();
}

#[test]
fn debug_formats_as_map() {
    let map: AvlMap<u32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
    assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
}

#[test]
fn cursor_walks_in_order() {
    let map: WavlMap<u32, u32> = (1..=4).map(|k| (k, k * 10)).collect();

    let mut cursor = map.cursor();
    for key in 1..=4 {
        assert_eq!(cursor.next(&map), Ok(Some((&key, &(key * 10)))));
    }
    assert_eq!(cursor.next(&map), Ok(None));
    // A finished cursor stays finished.
    assert_eq!(cursor.next(&map), Ok(None));
}

#[test]
fn cursor_fails_fast_on_mutation() {
    let mut map: AvlMap<u32, u32> = (1..=4).map(|k| (k, k)).collect();

    let mut cursor = map.cursor();
    assert_eq!(cursor.next(&map), Ok(Some((&1, &1))));

    map.put(5, 5);
    assert_eq!(cursor.next(&map), Err(Error::ConcurrentMutation));

    let mut cursor = map.cursor();
    map.remove(&5);
    assert_eq!(cursor.next(&map), Err(Error::ConcurrentMutation));

    let mut cursor = map.cursor();
    map.clear();
    assert_eq!(cursor.next(&map), Err(Error::ConcurrentMutation));
}

#[test]
fn value_replacement_leaves_cursors_valid() {
    let mut map: AvlMap<u32, u32> = (1..=3).map(|k| (k, k)).collect();

    let mut cursor = map.cursor();
    assert_eq!(cursor.next(&map), Ok(Some((&1, &1))));

    assert_eq!(map.put(2, 200), Some(2));
    assert_eq!(cursor.next(&map), Ok(Some((&2, &200))));
}

#[test]
fn cursor_remove_keeps_walking() {
    let mut map: WavlMap<u32, u32> = (1..=6).map(|k| (k, k)).collect();

    let mut cursor = map.cursor();
    let mut seen = Vec::new();
    while let Some((&key, _)) = cursor.next(&map).unwrap() {
        seen.push(key);
        if key % 2 == 0 {
            assert_eq!(cursor.remove(&mut map).unwrap(), Some(key));
            map.assert_invariants();
        }
    }

    assert_eq!(seen, [1, 2, 3, 4, 5, 6]);
    let keys: Vec<u32> = map.iter().map(|(&k, _)| k).collect();
    assert_eq!(keys, [1, 3, 5]);
}

#[test]
fn cursor_remove_interior_node() {
    // Removing an entry whose node has two children splices the successor
    // into its slot; the cursor must still yield the successor afterwards.
    let mut map: AvlMap<u32, u32> = [4, 2, 6, 1, 3, 5, 7].into_iter().map(|k| (k, k)).collect();

    let mut cursor = map.cursor();
    let mut seen = Vec::new();
    while let Some((&key, _)) = cursor.next(&map).unwrap() {
        seen.push(key);
        if key == 4 {
            assert_eq!(cursor.remove(&mut map).unwrap(), Some(4));
            map.assert_invariants();
        }
    }

    assert_eq!(seen, [1, 2, 3, 4, 5, 6, 7]);
    let keys: Vec<u32> = map.iter().map(|(&k, _)| k).collect();
    assert_eq!(keys, [1, 2, 3, 5, 6, 7]);
}

#[test]
fn cursor_remove_without_entry_is_noop() {
    let mut map: AvlMap<u32, u32> = (1..=3).map(|k| (k, k)).collect();

    let mut cursor = map.cursor();
    assert_eq!(cursor.remove(&mut map), Ok(None));

    assert_eq!(cursor.next(&map), Ok(Some((&1, &1))));
    assert_eq!(cursor.remove(&mut map), Ok(Some(1)));
    // The entry was already taken; a second remove has nothing to act on.
    assert_eq!(cursor.remove(&mut map), Ok(None));
    assert_eq!(map.len(), 2);
}

#[test]
#[should_panic(expected = "cursor used with a map other than its origin")]
fn cursor_rejects_foreign_map() {
    let first: AvlMap<u32, u32> = (1..=3).map(|k| (k, k)).collect();
    let second: AvlMap<u32, u32> = (1..=3).map(|k| (k, k)).collect();

    let mut cursor = first.cursor();
    let _ = cursor.next(&second);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn avl_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(Avl, ops);
    }

    #[test]
    fn wavl_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(Wavl, ops);
    }

    #[test]
    fn ravl_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(Ravl::new(false), ops);
    }

    #[test]
    fn ravl_rebalancing_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(Ravl::new(true), ops);
    }

    #[test]
    fn cursor_removal_equivalence(
        keys in proptest::collection::vec(any::<u16>(), 0..100),
        removals in proptest::collection::vec(any::<bool>(), 0..200),
    ) {
        model::run_cursor_removal(Wavl, keys, removals);
    }
}
