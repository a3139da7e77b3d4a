//! StableSet: a set whose elements never move once inserted.
//!
//! Values live in a [`StableList`]; the probing table only stores
//! `(hash, pointer)` pairs into it. Growth rebuilds that index and nothing
//! else, so every reference returned by [`StableSet::insert`] stays valid
//! for as long as the set is borrowed. There is no removal.
//!
//! `insert` takes `&self`. The index sits in a `RefCell`: a key's `Eq`
//! that calls back into the same set while it is probing panics on the
//! borrow flag instead of observing a half-updated index. The stored hash is
//! used on rehash, so `Hash` is never called after insertion.

use crate::config::TableConfig;
use crate::hash::DispersionState;
use crate::raw_table::{InsertionResult, RawTable};
use crate::stable_list::{self, StableList};
use core::borrow::Borrow;
use core::cell::RefCell;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use core::ptr::NonNull;

// Index entry: the full hash plus the element's permanent address.
#[derive(Copy, Clone)]
struct StableSlot<T> {
    hash: u64,
    value: NonNull<T>,
}

impl<T> StableSlot<T> {
    #[inline]
    fn value(&self) -> &T {
        // SAFETY: `value` points into the owning set's `StableList`, whose
        // elements are never moved or dropped before the set itself.
        unsafe { self.value.as_ref() }
    }
}

pub struct StableSet<T, S = DispersionState> {
    hasher: S,
    index: RefCell<RawTable<StableSlot<T>>>,
    values: StableList<T>,
}

// SAFETY: the raw pointers in `index` only ever point into `values`, which
// moves with the set. The set is `!Sync` through `RefCell`.
unsafe impl<T: Send, S: Send> Send for StableSet<T, S> {}

impl<T> StableSet<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(DispersionState)
    }

    /// Allocate exactly `capacity` index slots up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(TableConfig::default().with_capacity(capacity))
    }

    pub fn with_config(config: TableConfig) -> Self {
        Self::with_config_and_hasher(config, DispersionState)
    }
}

impl<T, S> Default for StableSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> StableSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(TableConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Self {
        Self {
            hasher,
            index: RefCell::new(RawTable::with_config(&config)),
            values: StableList::new(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// Slot count of the index (not of the value storage).
    pub fn capacity(&self) -> usize {
        self.index.borrow().capacity()
    }
    pub fn load_factor(&self) -> f64 {
        self.index.borrow().load_factor()
    }
    /// Current index capacity and load factor.
    pub fn config(&self) -> TableConfig {
        TableConfig::default()
            .with_capacity(self.capacity())
            .with_load_factor(self.load_factor())
    }

    /// Insert `value` unless an equal element is present.
    ///
    /// Returns the element's permanent location and `Success`, or the
    /// existing equal element and `Exists` (dropping `value`).
    pub fn insert(&self, value: T) -> (&T, InsertionResult) {
        let hash = self.hasher.hash_one(&value);
        let mut index = self.index.borrow_mut();
        let found = index.find_or_find_insert_slot(
            hash,
            |slot| *slot.value() == value,
            |slot| slot.hash,
        );
        match found {
            Ok(i) => {
                let existing = index.bucket(i).value;
                // `value` may run user code on drop; release the index first.
                drop(index);
                drop(value);
                // SAFETY: see `StableSlot::value`; the borrow is tied to `&self`.
                (unsafe { existing.as_ref() }, InsertionResult::Exists)
            }
            Err(slot) => {
                let stored = self.values.push(value);
                index.insert_in_slot(
                    hash,
                    slot,
                    StableSlot {
                        hash,
                        value: NonNull::from(stored),
                    },
                );
                (stored, InsertionResult::Success)
            }
        }
    }

    pub fn find<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(q);
        let index = self.index.borrow();
        let i = index.find(hash, |slot| slot.value().borrow() == q)?;
        let ptr = index.bucket(i).value;
        // SAFETY: see `StableSlot::value`; the borrow is tied to `&self`.
        Some(unsafe { ptr.as_ref() })
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Grow the index ahead of time so `additional` more elements fit.
    pub fn reserve(&self, additional: usize) {
        self.index
            .borrow_mut()
            .reserve(additional, |slot| slot.hash);
    }
}

impl<T, S> StableSet<T, S> {
    /// Element number `i` in insertion order.
    pub fn get(&self, i: usize) -> Option<&T> {
        self.values.get(i)
    }

    /// Elements in insertion order.
    pub fn iter(&self) -> stable_list::Iter<'_, T> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values.into_vec()
    }
}

impl<T, S> Clone for StableSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        let out = Self::with_config_and_hasher(self.config(), self.hasher.clone());
        for v in self.iter() {
            out.insert(v.clone());
        }
        out
    }
}

impl<T: fmt::Debug, S> fmt::Debug for StableSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> Index<usize> for StableSet<T, S> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.values[i]
    }
}

impl<T, S> Extend<T> for StableSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v);
        }
    }
}

impl<T, S> FromIterator<T> for StableSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<'a, T, S> IntoIterator for &'a StableSet<T, S> {
    type Item = &'a T;
    type IntoIter = stable_list::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
