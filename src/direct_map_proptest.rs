#![cfg(test)]

// Property tests for DirectMap kept inside the crate so they can look at
// the probing table's bookkeeping alongside the public API.

use crate::config::TableConfig;
use crate::direct_map::DirectMap;
use crate::raw_table::InsertionResult;
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

// hashbrown is the reference model: a mature table with the same
// insert/remove/lookup surface.
type Model = hashbrown::HashMap<Key, i32>;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertWith(usize, i32),
    InsertOrAssign(usize, i32),
    Erase(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertWith(i, v)),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertOrAssign(i, v)),
            3 => idx.clone().prop_map(OpI::Erase),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = TableConfig> {
    (0usize..48, 0.05f64..0.95)
        .prop_map(|(cap, lf)| TableConfig::default().with_capacity(cap).with_load_factor(lf))
}

// Drive one scenario against `sut`, comparing with the model after every op.
fn run_scenario<S: BuildHasher>(
    mut sut: DirectMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model = Model::new();
    let default_calls = Rc::new(Cell::new(0));

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let before = model.get(&k).copied();
                let (stored, res) = sut.insert(k.clone(), v);
                match before {
                    Some(old) => {
                        prop_assert_eq!(res, InsertionResult::Exists);
                        prop_assert_eq!(*stored, old, "insert must not overwrite");
                    }
                    None => {
                        prop_assert_eq!(res, InsertionResult::Success);
                        prop_assert_eq!(*stored, v);
                        model.insert(k, v);
                    }
                }
            }
            OpI::InsertWith(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let counter = default_calls.clone();
                let before = counter.get();
                let (_, res) = sut.insert_with(k.clone(), move || {
                    counter.set(counter.get() + 1);
                    v
                });
                if already {
                    prop_assert_eq!(res, InsertionResult::Exists);
                    prop_assert_eq!(default_calls.get(), before);
                } else {
                    prop_assert_eq!(res, InsertionResult::Success);
                    prop_assert_eq!(default_calls.get(), before + 1);
                    model.insert(k, v);
                }
            }
            OpI::InsertOrAssign(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let (stored, res) = sut.insert_or_assign(k.clone(), v);
                prop_assert_eq!(*stored, v);
                let expected = if already {
                    InsertionResult::Assigned
                } else {
                    InsertionResult::Success
                };
                prop_assert_eq!(res, expected);
                model.insert(k, v);
            }
            OpI::Erase(i) => {
                let k = key_from(pool, i);
                let removed = sut.remove(&k);
                let expected = model.remove_entry(&k);
                prop_assert_eq!(removed, expected);
                prop_assert!(!sut.contains_key(&k));
                prop_assert!(!sut.erase(&k), "second erase must report absence");
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.find(&k), model.get_key_value(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap, "clear keeps capacity");
                prop_assert_eq!(sut.tombstones(), 0);
            }
            OpI::Iterate => {
                let s_keys: Vec<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let unique: BTreeSet<_> = s_keys.iter().cloned().collect();
                prop_assert_eq!(s_keys.len(), unique.len(), "iteration yielded a key twice");
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(unique, m_keys);
                for (k, v) in sut.iter() {
                    prop_assert_eq!(Some(v), model.get(k));
                }
            }
        }

        // Post-conditions after each op
        // 1) Size parity
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        // 2) Load factor holds and occupied plus deleted slots fit the table
        if sut.capacity() > 0 {
            let ratio = sut.len() as f64 / sut.capacity() as f64;
            prop_assert!(ratio <= sut.load_factor(), "ratio {} over limit", ratio);
        }
        prop_assert!(sut.len() + sut.tombstones() <= sut.capacity());
    }
    Ok(())
}

// Property: State-machine equivalence against hashbrown::HashMap.
// Invariants exercised across random operation sequences:
// - `insert` never overwrites; `insert_or_assign` overwrites the value only.
// - `insert_with` builds the value exactly when the key is absent.
// - `erase` returns the owned `(K,V)` matching the model; a second erase is a no-op.
// - `iter` yields each live entry exactly once; key set equals the model's key set.
// - `len` parity, load-factor bound and slot accounting after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), config in arb_config()) {
        let sut: DirectMap<Key, i32> = DirectMap::with_config(config);
        run_scenario(sut, &pool, ops)?;
    }
}

// Collision variant: keep only two bits of a real hash so that every key
// shares one of four home slots and most tags collide. Stresses equality
// resolution, long probe runs and reuse of tombstones inside them.
#[derive(Clone, Default)]
struct NarrowBuildHasher;
struct NarrowHasher(std::collections::hash_map::DefaultHasher);
impl BuildHasher for NarrowBuildHasher {
    type Hasher = NarrowHasher;
    fn build_hasher(&self) -> Self::Hasher {
        NarrowHasher(Default::default())
    }
}
impl Hasher for NarrowHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes);
    }
    fn finish(&self) -> u64 {
        self.0.finish() & 0b11
    }
}

// Property: Same state-machine invariants as above, under heavy clustering.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(), config in arb_config()) {
        let sut = DirectMap::with_config_and_hasher(config, NarrowBuildHasher);
        run_scenario(sut, &pool, ops)?;
    }
}

// Property: a key erased and reinserted while it sits behind other members
// of its cluster is stored once, whatever the interleaving.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_reinsert_behind_tombstones(keys in proptest::collection::vec(0u16..64, 1..40), victim in 0u16..64) {
        let mut sut = DirectMap::with_config_and_hasher(
            TableConfig::default().with_capacity(64).with_load_factor(0.9),
            NarrowBuildHasher,
        );
        for &k in &keys {
            sut.insert_or_assign(k, ());
        }
        let first = keys[0];
        sut.erase(&first);
        sut.insert(victim, ());
        sut.insert(victim, ());
        sut.insert(first, ());
        let occurrences = sut.keys().filter(|&&k| k == victim).count();
        prop_assert_eq!(occurrences, 1);
        let mut expected: BTreeSet<u16> = keys.iter().copied().collect();
        expected.insert(victim);
        let got: BTreeSet<u16> = sut.keys().copied().collect();
        prop_assert_eq!(got, expected);
    }
}
