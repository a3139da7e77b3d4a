//! DirectMap: keys and values stored inline in the slot array.
//!
//! Growth moves entries, so any reference obtained from the map is tied to
//! a borrow of it and cannot outlive the next insertion.

use crate::config::TableConfig;
use crate::hash::DispersionState;
use crate::raw_table::{InsertionResult, RawTable};
use crate::slots;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;

pub struct DirectMap<K, V, S = DispersionState> {
    hasher: S,
    table: RawTable<(K, V)>,
}

impl<K, V> DirectMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(DispersionState)
    }

    /// Allocate exactly `capacity` slots up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(TableConfig::default().with_capacity(capacity))
    }

    pub fn with_config(config: TableConfig) -> Self {
        Self::with_config_and_hasher(config, DispersionState)
    }
}

impl<K, V, S> Default for DirectMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

/// Iterator over immutable entries in `DirectMap`, in slot order.
pub struct Iter<'a, K, V> {
    it: slots::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

/// Iterator over mutable entries in `DirectMap`.
pub struct IterMut<'a, K, V> {
    it: slots::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (&*k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over the entries of a `DirectMap`.
pub struct IntoIter<K, V> {
    it: slots::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.it.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> DirectMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(TableConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Self {
        Self {
            hasher,
            table: RawTable::with_config(&config),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }
    /// Current capacity and load factor, e.g. to build a like-sized map.
    pub fn config(&self) -> TableConfig {
        TableConfig::default()
            .with_capacity(self.capacity())
            .with_load_factor(self.load_factor())
    }
    /// Tombstones currently left by `remove`/`erase`.
    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    fn find_index<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table.find(hash, |(k, _)| k.borrow() == q)
    }

    /// Key and value stored for `q`.
    pub fn find<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find_index(q)?;
        let (k, v) = self.table.bucket(i);
        Some((k, v))
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find_index(q)?;
        Some(&mut self.table.bucket_mut(i).1)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_index(q).is_some()
    }

    /// Insert `key -> value` unless `key` is present. On `Exists` the stored
    /// value is returned untouched and `value` is dropped.
    pub fn insert(&mut self, key: K, value: V) -> (&mut V, InsertionResult) {
        self.insert_with(key, || value)
    }

    /// Like [`DirectMap::insert`], building the value only when the key is
    /// absent.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> (&mut V, InsertionResult)
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        let hasher = &self.hasher;
        match self.table.find_or_find_insert_slot(
            hash,
            |(k, _)| *k == key,
            |(k, _)| hasher.hash_one(k),
        ) {
            Ok(i) => (&mut self.table.bucket_mut(i).1, InsertionResult::Exists),
            Err(slot) => {
                let entry = self.table.insert_in_slot(hash, slot, (key, default()));
                (&mut entry.1, InsertionResult::Success)
            }
        }
    }

    /// Insert `key -> value`, overwriting the value (never the key) when
    /// `key` is already present.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (&mut V, InsertionResult) {
        let hash = self.make_hash(&key);
        let hasher = &self.hasher;
        match self.table.find_or_find_insert_slot(
            hash,
            |(k, _)| *k == key,
            |(k, _)| hasher.hash_one(k),
        ) {
            Ok(i) => {
                let slot = &mut self.table.bucket_mut(i).1;
                *slot = value;
                (slot, InsertionResult::Assigned)
            }
            Err(slot) => {
                let entry = self.table.insert_in_slot(hash, slot, (key, value));
                (&mut entry.1, InsertionResult::Success)
            }
        }
    }

    /// Remove the entry for `q`, leaving a tombstone in its slot.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find_index(q)?;
        self.table.remove(i)
    }

    /// `true` if an entry for `q` existed and was dropped.
    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(q).is_some()
    }

    /// Drop all entries; capacity is retained.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Grow ahead of time so `additional` more entries fit without growth.
    pub fn reserve(&mut self, additional: usize) {
        let hasher = &self.hasher;
        self.table
            .reserve(additional, |(k, _)| hasher.hash_one(k));
    }
}

impl<K, V, S> DirectMap<K, V, S> {
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.table.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, v)| v)
    }
}

impl<K, V, S> Clone for DirectMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            table: self.table.clone(),
        }
    }
}

impl<K, V, S> fmt::Debug for DirectMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for DirectMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for DirectMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Extend<(K, V)> for DirectMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Later pairs overwrite earlier values for the same key.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert_or_assign(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for DirectMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, Q, V, S> Index<&Q> for DirectMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in DirectMap")
    }
}

impl<'a, K, V, S> IntoIterator for &'a DirectMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut DirectMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for DirectMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            it: self.table.into_entries(),
        }
    }
}
