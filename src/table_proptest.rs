#![cfg(test)]

// Property tests for Table kept inside the crate so they can audit the
// slot array against the counters.

use crate::config::TableConfig;
use crate::table::Table;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,4}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Small initial capacity so random runs cross grow and shrink boundaries.
fn small_config() -> TableConfig {
    TableConfig::builder().initial_capacity(4).build()
}

fn run_scenario<S: BuildHasher>(
    mut sut: Table<i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<String, i32> = BTreeMap::new();
    let initial = sut.capacity();

    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = &pool[i];
                let before = sut.len();
                let existed = model.contains_key(k);
                prop_assert!(sut.put(k, v).is_ok());
                model.insert(k.clone(), v);
                prop_assert_eq!(sut.len(), if existed { before } else { before + 1 });
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k), model.remove(k));
                prop_assert!(!sut.contains(k));
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains(&s), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k), model.get_mut(k)) {
                    (Some(a), Some(b)) => {
                        *a = a.wrapping_add(d);
                        *b = b.wrapping_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "get_mut presence mismatch for {:?}", k),
                }
            }
            OpI::Iterate => {
                let mut seen = BTreeSet::new();
                let mut it = sut.iter();
                while it.advance() {
                    let key = it.current().expect("positioned on an entry");
                    prop_assert!(seen.insert(key.to_string()), "key visited twice");
                }
                prop_assert!(it.at_end());
                let expected: BTreeSet<String> = model.keys().cloned().collect();
                prop_assert_eq!(seen, expected);
            }
        }

        // Post-conditions after each op
        // 1) Counters match the slot array and never exceed capacity
        prop_assert_eq!(sut.audit(), (sut.len(), sut.tombstones()));
        prop_assert!(sut.len() + sut.tombstones() <= sut.capacity());
        // 2) Capacity never drops below the initial size
        prop_assert!(sut.capacity() >= initial);
        // 3) Size parity
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }

    // Every surviving key is still mapped after all resizes.
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: State-machine equivalence against BTreeMap.
// Invariants exercised across random operation sequences:
// - Last write wins; overwrites leave `len` unchanged.
// - `remove` returns the stored value once, then the key is absent.
// - Iteration visits every live key exactly once.
// - Counters agree with the slot array and stay within capacity.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: Table<i32> = Table::with_config(small_config()).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one home
// slot, so every lookup walks the full cluster including tombstones.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = Table::with_config_and_hasher(small_config(), ConstBuildHasher).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_fnv((pool, ops) in arb_scenario()) {
        let sut = Table::with_config_and_hasher(small_config(), crate::hash::Fnv1aBuildHasher).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}
