#![no_main]
use libfuzzer_sys::fuzz_target;

use bbst::model::{run_btree_equivalence, Op};
use bbst::{Avl, Ravl, Wavl};

fuzz_target!(|ops: Vec<Op>| {
    run_btree_equivalence(Avl, ops.clone());
    run_btree_equivalence(Wavl, ops.clone());
    run_btree_equivalence(Ravl::new(false), ops.clone());
    run_btree_equivalence(Ravl::new(true), ops);
});
