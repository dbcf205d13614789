//! Console comparison of the balancing policies.
//!
//! With no arguments, times each policy over random, sequential, and
//! clustered integer workloads. With a file argument, replays a recorded
//! whitespace- or comma-delimited key capture instead.

use std::env;
use std::error::Error;
use std::fs;
use std::time::Instant;

use rand::prelude::*;

use bbst::{replay, Avl, Policy, Ravl, TreeMap, Wavl};

const KEY_COUNT: usize = (1 << 18) - 1;
const CLUSTER: u32 = 12;

fn random_workload(rng: &mut impl Rng) -> Vec<u32> {
    (0..KEY_COUNT).map(|_| rng.gen()).collect()
}

fn sequential_workload() -> Vec<u32> {
    (0..KEY_COUNT as u32).collect()
}

/// Ascending runs of [`CLUSTER`] keys starting at random offsets, modeling
/// partially sorted input.
fn clustered_workload(rng: &mut impl Rng) -> Vec<u32> {
    let mut keys = Vec::with_capacity(KEY_COUNT + CLUSTER as usize);
    while keys.len() < KEY_COUNT {
        let base = rng.gen_range(0..u32::MAX - CLUSTER);
        for offset in 0..CLUSTER {
            keys.push(base + offset);
        }
    }
    keys.truncate(KEY_COUNT);
    keys
}

fn run_policy<P: Policy>(name: &str, policy: P, keys: &[u32]) {
    let mut map: TreeMap<u32, u32, P> = TreeMap::with_policy(policy);

    let start = Instant::now();
    for &key in keys {
        map.put(key, key);
    }
    let insert = start.elapsed();

    let len = map.len();
    let height = map.height().unwrap_or(0);

    // One lookup, one removal, and one reinsert per key.
    let start = Instant::now();
    for &key in keys {
        if let Some(value) = map.get(&key).copied() {
            map.remove(&key);
            map.put(key, value);
        }
    }
    let mixed = start.elapsed();

    let start = Instant::now();
    for &key in keys {
        map.remove(&key);
    }
    let delete = start.elapsed();

    let rotations = map.rotations();
    assert!(map.is_empty());

    println!(
        "  {name:<16} insert {insert:>9.2?}  mixed {mixed:>9.2?}  delete {delete:>9.2?}  \
         size {len:>7}  height {height:>3}  rotations {rotations}"
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let workloads: Vec<(String, Vec<u32>)> = match env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)?;
            let keys = replay::parse_keys(&text)?;
            vec![(format!("replay {path}"), keys)]
        }
        None => {
            let mut rng = rand::thread_rng();
            vec![
                (String::from("random"), random_workload(&mut rng)),
                (String::from("sequential"), sequential_workload()),
                (String::from("clustered"), clustered_workload(&mut rng)),
            ]
        }
    };

    for (name, keys) in &workloads {
        println!("{name} ({} keys)", keys.len());
        run_policy("avl", Avl, keys);
        run_policy("wavl", Wavl, keys);
        run_policy("ravl", Ravl::new(false), keys);
        run_policy("ravl rebalancing", Ravl::new(true), keys);
        println!();
    }

    Ok(())
}
