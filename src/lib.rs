//! sentinel-table: open-addressing hash tables driven by a one-byte-per-slot
//! sentinel array, in two flavours: a map that stores entries inline and a
//! set whose elements never move.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one probing engine, reasoned about once, reused by both
//!   containers through closures instead of per-container copies.
//! - Layers:
//!   - `hash`: integer finalizers, avalanche mixing, a seed combiner and a
//!     capped FNV-1a byte hash, packaged as the default `BuildHasher`.
//!   - `sentinel` / `probe`: the metadata byte (EMPTY, DELETED, or ACTIVE
//!     with a 7-bit hash tag) and the linear probe walks over it.
//!   - `slots::SlotArena<E>`: uninitialised slot storage paired with the
//!     sentinel array; the only place values are constructed or dropped.
//!   - `raw_table::RawTable<E>`: lookup, insertion-candidate search, erase,
//!     growth and tombstone purge on top of the arena.
//!   - `DirectMap<K, V, S>`: `(K, V)` stored inline in the slots.
//!   - `StableSet<T, S>`: slots store `(hash, pointer)` into a `StableList`
//!     so values keep their address when the index grows.
//!
//! Constraints
//! - Single-threaded: no internal locking. `StableSet` is `!Sync`.
//! - Every operation is synchronous and bounded by the table's capacity.
//! - Preconditions (`0 < load_factor < 1`) are `debug_assert!`ed only;
//!   `TableConfig::new` offers a checked alternative.
//! - Allocation failure aborts through the global allocator.
//!
//! Probing invariants
//! - EMPTY ends a lookup; DELETED does not. A 7-bit tag match is always
//!   confirmed with `Eq`.
//! - Insertion keeps comparing past tombstones until an EMPTY slot and only
//!   then reuses the first tombstone it saw, so a key stored behind a
//!   tombstone is found rather than duplicated.
//! - Every walk visits at most `capacity` slots.
//!
//! Growth
//! - Checked before every insertion: if `(len + 1) / capacity` would exceed
//!   the load factor, capacity becomes `(capacity + 16) * 2` (repeated until
//!   it fits). After any insertion `len / capacity <= load_factor`.
//! - Tombstones count toward a second check that rebuilds the table at the
//!   same capacity; tombstones are only ever cleared by such a rebuild.
//! - Entries move directly into the newly allocated arrays.
//!
//! Reference stability
//! - `DirectMap`: growth moves entries. References are borrows of the map
//!   and end at the next mutation.
//! - `StableSet`: `insert` takes `&self` and returns `&T` that stays valid
//!   across later inserts; growth reshuffles only the index.
//!
//! Notes and non-goals
//! - No thread safety, persistence or concurrent access.
//! - `StableSet` has no removal; it grows monotonically in insertion order.
//! - `DirectMap` does not preserve insertion order.

pub mod config;
pub mod direct_map;
mod direct_map_proptest;
pub mod hash;
pub mod probe;
mod raw_table;
pub mod sentinel;
mod slots;
pub mod stable_list;
pub mod stable_set;

// Public surface
pub use config::{ConfigError, TableConfig, DEFAULT_LOAD_FACTOR};
pub use direct_map::DirectMap;
pub use hash::{DispersionHasher, DispersionState};
pub use raw_table::InsertionResult;
pub use stable_list::StableList;
pub use stable_set::StableSet;
