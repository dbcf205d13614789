//! Model-based equivalence testing against `std::collections::BTreeMap`.
//!
//! The strategies here generate operation sequences whose keys are either
//! fresh random values or indices into the set of keys already present, so
//! that hits and misses are both exercised no matter how the map grows.
//! Exposed as the `model` feature for use by the fuzz targets.

extern crate std;

use std::{collections::BTreeMap, prelude::v1::*};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{Policy, TreeMap};

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Put(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_key(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len().max(1)]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Put(item) => FinalOp::Put(get_key(sorted, item)),
            Op::Get(item) => FinalOp::Get(get_key(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_key(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Put(u32),
    Get(u32),
    Remove(u32),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Put),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

pub fn run_btree_equivalence<P: Policy>(policy: P, ops: Vec<Op>) {
    let mut sorted_keys = Vec::with_capacity(ops.len());
    let mut btree = BTreeMap::new();
    let mut map: TreeMap<u32, u64, P> = TreeMap::with_policy(policy);

    fn insert_sorted(v: &mut Vec<u32>, key: u32) {
        if let Err(idx) = v.binary_search(&key) {
            v.insert(idx, key);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, key: u32) {
        if let Ok(idx) = v.binary_search(&key) {
            v.remove(idx);
        }
    }

    let mut final_ops = Vec::with_capacity(ops.len());
    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_keys);
        final_ops.push(final_op);

        match final_op {
            FinalOp::Put(key) => {
                insert_sorted(&mut sorted_keys, key);

                // The op index makes replacement values distinct from the
                // ones they displace.
                let value = op_id as u64;
                let from_btree = btree.insert(key, value);
                let from_map = map.put(key, value);

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(&key);
                let from_map = map.get(&key);

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Remove(key) => {
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree.remove(&key);
                let from_map = map.remove(&key);

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value();
                let from_map = map.first_entry();

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                let from_map = map.pop_first();

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value();
                let from_map = map.last_entry();

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopLast => {
                let from_btree = btree.pop_last();
                let from_map = map.pop_last();

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }
        }

        map.assert_invariants();
        assert_eq!(btree.len(), map.len());
        assert!(btree
            .iter()
            .zip(map.iter())
            .all(|((ak, av), (bk, bv))| ak == bk && av == bv));
    }
}

/// A map population and a removal mask for driving a cursor over it.
#[derive(Clone, Debug)]
pub struct CursorWorkload {
    pub keys: Vec<u16>,
    pub removals: Vec<bool>,
}

impl<'a> Arbitrary<'a> for CursorWorkload {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_keys = u8::arbitrary(u)? % 100;
        let num_removals = u16::arbitrary(u)? % 1000;

        let keys = core::iter::repeat_with(|| u16::arbitrary(u).unwrap_or(0))
            .take(num_keys.into())
            .collect();

        let removals = core::iter::repeat_with(|| bool::arbitrary(u).unwrap_or(false))
            .take(num_removals.into())
            .collect();

        Ok(CursorWorkload { keys, removals })
    }
}

pub fn run_cursor_removal<P: Policy>(policy: P, keys: Vec<u16>, removals: Vec<bool>) {
    let mut btree = BTreeMap::new();
    let mut map: TreeMap<u16, u16, P> = TreeMap::with_policy(policy);

    for key in keys {
        btree.insert(key, key);
        map.put(key, key);
    }

    let mut cursor = map.cursor();
    let mut step = 0usize;

    loop {
        let next = match cursor.next(&map) {
            Ok(entry) => entry.map(|(k, _)| *k),
            Err(e) => panic!("cursor invalidated at step {step}: {e}"),
        };
        let Some(key) = next else { break };

        if removals.get(step).copied().unwrap_or(false) {
            let removed = cursor.remove(&mut map).unwrap();
            assert_eq!(removed, Some(key), "remove at step {step}");
            btree.remove(&key);
            map.assert_invariants();
        }

        step += 1;
    }

    assert_eq!(btree.len(), map.len());
    assert!(btree
        .iter()
        .zip(map.iter())
        .all(|((ak, av), (bk, bv))| ak == bk && av == bv));
}
