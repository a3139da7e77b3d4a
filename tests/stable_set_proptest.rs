use proptest::prelude::*;
use sentinel_table::{InsertionResult, StableSet, TableConfig};
use std::collections::HashSet;

// Model StableSet with a Vec (order) plus a HashSet (membership) and check
// that every returned reference stays put.
proptest! {
    #[test]
    fn prop_stable_set_matches_model(
        values in proptest::collection::vec(0u32..200, 1..400),
        cap in 0usize..32,
        lf in 0.1f64..0.9,
    ) {
        let set = StableSet::with_config(TableConfig::new(cap, lf).expect("valid config"));
        let mut order: Vec<u32> = Vec::new();
        let mut seen: HashSet<u32> = HashSet::new();
        let mut refs: Vec<*const u32> = Vec::new();

        for v in values {
            let (r, res) = set.insert(v);
            prop_assert_eq!(*r, v);
            if seen.insert(v) {
                prop_assert_eq!(res, InsertionResult::Success);
                order.push(v);
                refs.push(r);
            } else {
                prop_assert_eq!(res, InsertionResult::Exists);
                let pos = order.iter().position(|&o| o == v).expect("model has it");
                prop_assert!(std::ptr::eq(r, refs[pos]));
            }
            prop_assert_eq!(set.len(), order.len());
            prop_assert!(set.len() as f64 / set.capacity() as f64 <= lf);
        }

        let got: Vec<u32> = set.iter().copied().collect();
        prop_assert_eq!(&got, &order);
        for (i, &p) in refs.iter().enumerate() {
            prop_assert!(std::ptr::eq(p, &set[i]));
        }
        for probe in 0u32..200 {
            prop_assert_eq!(set.contains(&probe), seen.contains(&probe));
        }
    }
}
