//! RawTable: the probing engine shared by `DirectMap` and `StableSet`.
//!
//! The table knows nothing about keys. Callers pass the entry hash plus two
//! capabilities as closures: `eq(&E)` to confirm a tag match and
//! `hasher(&E)` to place an entry again during a rehash. `DirectMap`
//! recomputes key hashes there, `StableSet` reads the hash stored in its
//! slot.
//!
//! Growth policy
//! - Checked before every insertion, never after: if
//!   `(len + 1) / capacity > load_factor` the table grows to
//!   `(capacity + 16) * 2`, repeatedly until the ratio fits.
//! - Otherwise, if tombstones push `(len + tombstones + 1) / capacity` over
//!   the limit, the table is rebuilt at the same capacity. Either way a
//!   fresh metadata array replaces the old one and tombstones vanish; they
//!   are never reset to EMPTY in place.
//! - Entries are moved straight into the new arrays; the old arena is freed
//!   only after every live entry has been migrated out of it.

use crate::config::{valid_load_factor, TableConfig};
use crate::probe::{self, Candidate};
use crate::slots::{IntoIter, Iter, IterMut, SlotArena};
use core::mem;

/// Outcome of an insertion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InsertionResult {
    /// The key was absent; a new entry was constructed.
    Success,
    /// The key was present; the table is unchanged and the new value was
    /// discarded.
    Exists,
    /// The key was present; its value was overwritten.
    Assigned,
}

/// Slot count after one growth step from `capacity`.
///
/// Panics with "capacity overflow" if the result does not fit in `usize`.
#[inline]
pub(crate) fn grown_capacity(capacity: usize) -> usize {
    capacity
        .checked_add(16)
        .and_then(|c| c.checked_mul(2))
        .expect("capacity overflow")
}

#[inline]
fn exceeds(entries: usize, capacity: usize, load_factor: f64) -> bool {
    capacity == 0 || entries as f64 / capacity as f64 > load_factor
}

pub(crate) struct RawTable<E> {
    arena: SlotArena<E>,
    load_factor: f64,
}

impl<E> RawTable<E> {
    pub(crate) fn with_config(config: &TableConfig) -> Self {
        debug_assert!(valid_load_factor(config.load_factor()));
        if config.initial_capacity() > 0 {
            tracing::trace!(
                capacity = config.initial_capacity(),
                load_factor = config.load_factor(),
                "pre-sized table"
            );
        }
        Self {
            arena: SlotArena::new(config.initial_capacity()),
            load_factor: config.load_factor(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    #[inline]
    pub(crate) fn tombstones(&self) -> usize {
        self.arena.tombstones()
    }

    #[inline]
    pub(crate) fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Entry stored at `index`, which must come from a probe of this table
    /// with no mutation in between.
    #[inline]
    pub(crate) fn bucket(&self, index: usize) -> &E {
        self.arena
            .get(index)
            .expect("probe result must point at an active slot")
    }

    #[inline]
    pub(crate) fn bucket_mut(&mut self, index: usize) -> &mut E {
        self.arena
            .get_mut(index)
            .expect("probe result must point at an active slot")
    }

    /// Read path: index of the entry with `hash` accepted by `eq`.
    #[inline]
    pub(crate) fn find(&self, hash: u64, mut eq: impl FnMut(&E) -> bool) -> Option<usize> {
        let arena = &self.arena;
        probe::lookup(arena.ctrl(), hash, |i| arena.get(i).map_or(false, &mut eq))
    }

    /// Run the growth check for one more entry, then search for `hash`.
    /// `Ok(index)` is an existing equal entry, `Err(index)` the slot to
    /// construct into with [`RawTable::insert_in_slot`].
    pub(crate) fn find_or_find_insert_slot(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(&E) -> bool,
        hasher: impl Fn(&E) -> u64,
    ) -> Result<usize, usize> {
        self.reserve_one(&hasher);
        let arena = &self.arena;
        let found = probe::find_or_vacant(arena.ctrl(), hash, |i| {
            arena.get(i).map_or(false, &mut eq)
        });
        match found.expect("growth check leaves a non-active slot on every chain") {
            Candidate::Occupied(i) => Ok(i),
            Candidate::Vacant(i) => Err(i),
        }
    }

    /// Construct `value` at `slot`, a vacant index returned by
    /// [`RawTable::find_or_find_insert_slot`].
    #[inline]
    pub(crate) fn insert_in_slot(&mut self, hash: u64, slot: usize, value: E) -> &mut E {
        self.arena.construct(slot, hash, value)
    }

    /// Move the entry at `index` out, leaving a tombstone.
    #[inline]
    pub(crate) fn remove(&mut self, index: usize) -> Option<E> {
        self.arena.take(index)
    }

    pub(crate) fn clear(&mut self) {
        self.arena.clear();
    }

    /// Make room for `additional` more entries without further growth.
    pub(crate) fn reserve(&mut self, additional: usize, hasher: impl Fn(&E) -> u64) {
        let wanted = self.len().saturating_add(additional);
        if wanted == 0 {
            return;
        }
        let mut capacity = self.capacity();
        while exceeds(wanted, capacity, self.load_factor) {
            capacity = grown_capacity(capacity);
        }
        if capacity != self.capacity() {
            self.resize(capacity, &hasher);
        }
    }

    fn reserve_one(&mut self, hasher: &impl Fn(&E) -> u64) {
        let capacity = self.capacity();
        let needed = self.len() + 1;
        if exceeds(needed, capacity, self.load_factor) {
            let mut grown = grown_capacity(capacity);
            while exceeds(needed, grown, self.load_factor) {
                grown = grown_capacity(grown);
            }
            self.resize(grown, hasher);
        } else if self.tombstones() > 0
            && exceeds(needed + self.tombstones(), capacity, self.load_factor)
        {
            tracing::debug!(
                capacity,
                len = self.len(),
                tombstones = self.tombstones(),
                "purging tombstones"
            );
            self.resize(capacity, hasher);
        }
    }

    /// Rebuild into fresh arrays of `new_capacity` slots.
    fn resize(&mut self, new_capacity: usize, hasher: &impl Fn(&E) -> u64) {
        debug_assert!(new_capacity > self.len());
        tracing::debug!(
            old_capacity = self.capacity(),
            new_capacity,
            len = self.len(),
            "rehashing table"
        );
        let old = mem::replace(&mut self.arena, SlotArena::new(new_capacity));
        for entry in old.into_entries() {
            let hash = hasher(&entry);
            let slot = probe::first_open(self.arena.ctrl(), hash)
                .expect("new capacity exceeds the number of migrated entries");
            self.arena.construct(slot, hash, entry);
        }
    }

    #[inline]
    pub(crate) fn iter(&self) -> Iter<'_, E> {
        self.arena.iter()
    }

    #[inline]
    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, E> {
        self.arena.iter_mut()
    }

    #[inline]
    pub(crate) fn into_entries(self) -> IntoIter<E> {
        self.arena.into_entries()
    }
}

impl<E: Clone> Clone for RawTable<E> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            load_factor: self.load_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Entries carry their own hash so tests can pick probe positions.
    #[derive(Clone, Debug, PartialEq)]
    struct E {
        key: u32,
        hash: u64,
    }

    fn table(capacity: usize, load_factor: f64) -> RawTable<E> {
        RawTable::with_config(&TableConfig::new(capacity, load_factor).unwrap())
    }

    fn insert(t: &mut RawTable<E>, key: u32, hash: u64) -> InsertionResult {
        match t.find_or_find_insert_slot(hash, |e| e.key == key, |e| e.hash) {
            Ok(_) => InsertionResult::Exists,
            Err(slot) => {
                t.insert_in_slot(hash, slot, E { key, hash });
                InsertionResult::Success
            }
        }
    }

    fn find(t: &RawTable<E>, key: u32, hash: u64) -> Option<usize> {
        t.find(hash, |e| e.key == key)
    }

    #[test]
    fn grown_capacity_rule() {
        assert_eq!(grown_capacity(0), 32);
        assert_eq!(grown_capacity(4), 40);
        assert_eq!(grown_capacity(40), 112);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn grown_capacity_overflow_panics() {
        grown_capacity(usize::MAX / 2);
    }

    /// Invariant: a reservation no capacity can satisfy panics instead of
    /// wrapping the capacity around.
    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn reserve_beyond_usize_panics() {
        let mut t = table(0, 0.75);
        t.reserve(usize::MAX, |e| e.hash);
    }

    /// Invariant: with capacity 4 and load factor 0.70 the check runs before the
    /// insertion that would break the ratio: two entries fit, the third would
    /// reach 0.75 so the table grows to 40 slots first. Earlier entries stay
    /// findable and no later insertion of the four grows again.
    #[test]
    fn growth_is_checked_before_insertion() {
        let mut t = table(4, 0.70);
        for k in 0..2 {
            assert_eq!(insert(&mut t, k, k as u64), InsertionResult::Success);
            assert_eq!(t.capacity(), 4);
        }
        assert_eq!(insert(&mut t, 2, 2), InsertionResult::Success);
        assert_eq!(t.capacity(), 40);
        assert_eq!(insert(&mut t, 3, 3), InsertionResult::Success);
        assert_eq!(t.capacity(), 40);
        for k in 0..4 {
            let i = find(&t, k, k as u64).expect("present after growth");
            assert_eq!(t.bucket(i).key, k);
        }
    }

    /// Invariant: after every insertion `len / capacity <= load_factor`, across many
    /// growth cycles, and every entry stays findable.
    #[test]
    fn load_factor_holds_across_growth_cycles() {
        let mut t = table(0, 0.5);
        for k in 0..2_000u32 {
            let h = crate::hash::hash_one(&k);
            insert(&mut t, k, h);
            assert!(t.len() as f64 / t.capacity() as f64 <= 0.5);
        }
        assert_eq!(t.len(), 2_000);
        for k in 0..2_000u32 {
            assert!(find(&t, k, crate::hash::hash_one(&k)).is_some());
        }
    }

    /// Invariant: a very small load factor grows repeatedly in one step until the
    /// ratio fits.
    #[test]
    fn tiny_load_factor_grows_until_it_fits() {
        let mut t = table(0, 0.01);
        insert(&mut t, 1, 1);
        // 0 -> 32 -> 96 -> 224: one entry in 96 slots is still above 0.01
        assert_eq!(t.capacity(), 224);
        assert!(1.0 / t.capacity() as f64 <= 0.01);
        let previous = 96;
        assert_eq!(grown_capacity(previous), t.capacity());
        assert!(1.0 / previous as f64 > t.load_factor());
    }

    /// Invariant: insertion search keeps scanning past a tombstone and finds an
    /// equal key further down the chain instead of admitting a duplicate.
    #[test]
    fn no_duplicate_behind_tombstone() {
        let mut t = table(16, 0.9);
        // three keys on one chain starting at slot 0
        insert(&mut t, 1, 0);
        insert(&mut t, 2, 16);
        insert(&mut t, 3, 32);
        let i = find(&t, 1, 0).unwrap();
        assert!(t.remove(i).is_some());
        assert_eq!(t.tombstones(), 1);

        assert_eq!(insert(&mut t, 3, 32), InsertionResult::Exists);
        assert_eq!(t.len(), 2);
        assert_eq!(t.iter().filter(|e| e.key == 3).count(), 1);

        // a fresh key reuses the tombstone
        assert_eq!(insert(&mut t, 4, 48), InsertionResult::Success);
        assert_eq!(find(&t, 4, 48), Some(0));
        assert_eq!(t.tombstones(), 0);
    }

    /// Invariant: lookups walk past tombstones.
    #[test]
    fn find_skips_tombstones() {
        let mut t = table(8, 0.9);
        insert(&mut t, 1, 0);
        insert(&mut t, 2, 8);
        let i = find(&t, 1, 0).unwrap();
        t.remove(i);
        assert_eq!(find(&t, 1, 0), None);
        assert!(find(&t, 2, 8).is_some());
    }

    /// Invariant: when tombstones exhaust the load budget the table is rebuilt at
    /// the same capacity and the tombstones are gone.
    #[test]
    fn tombstones_are_purged_at_same_capacity() {
        let mut t = table(10, 0.5);
        for k in 0..5 {
            insert(&mut t, k, k as u64);
        }
        for k in 0..5 {
            let i = find(&t, k, k as u64).unwrap();
            t.remove(i);
        }
        assert_eq!((t.len(), t.tombstones()), (0, 5));
        insert(&mut t, 9, 9);
        assert_eq!(t.capacity(), 10);
        assert_eq!((t.len(), t.tombstones()), (1, 0));
        assert!(t.iter().all(|e| e.key == 9));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut t = table(0, 0.75);
        for k in 0..50 {
            insert(&mut t, k, k as u64);
        }
        let cap = t.capacity();
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), cap);
        assert_eq!(find(&t, 3, 3), None);
    }

    #[test]
    fn reserve_presizes() {
        let mut t = table(0, 0.75);
        t.reserve(100, |e| e.hash);
        let cap = t.capacity();
        assert!(100.0 / cap as f64 <= 0.75);
        for k in 0..100 {
            insert(&mut t, k, k as u64);
        }
        assert_eq!(t.capacity(), cap);
        t.reserve(0, |e| e.hash);
        assert_eq!(t.capacity(), cap);
    }
}
