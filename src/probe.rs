//! Linear probing over a sentinel array.
//!
//! All three walks (lookup, insertion-candidate search, rehash placement)
//! share [`ProbeSeq`]: start at `hash % capacity`, step by one, wrap to zero
//! at the end, and stop after visiting every slot once. The bound means a
//! walk terminates even on a table without EMPTY slots.

use crate::sentinel::Sentinel;
use core::iter::FusedIterator;

#[derive(Clone, Debug)]
pub struct ProbeSeq {
    pos: usize,
    capacity: usize,
    remaining: usize,
}

impl ProbeSeq {
    #[inline]
    pub fn new(hash: u64, capacity: usize) -> Self {
        let pos = if capacity == 0 {
            0
        } else {
            (hash % capacity as u64) as usize
        };
        Self {
            pos,
            capacity,
            remaining: capacity,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let cur = self.pos;
        self.pos = if cur + 1 == self.capacity { 0 } else { cur + 1 };
        Some(cur)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ProbeSeq {}
impl FusedIterator for ProbeSeq {}

/// Outcome of [`find_or_vacant`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// Slot holding an entry equal to the probed key.
    Occupied(usize),
    /// Slot where a new entry may be written: the first tombstone on the
    /// chain if any, otherwise the EMPTY slot that ended the walk.
    Vacant(usize),
}

/// Read path. EMPTY ends the search, tombstones are stepped over, and a tag
/// match is confirmed with `eq(index)` before it counts.
#[inline]
pub fn lookup<F>(ctrl: &[Sentinel], hash: u64, mut eq: F) -> Option<usize>
where
    F: FnMut(usize) -> bool,
{
    for i in ProbeSeq::new(hash, ctrl.len()) {
        let s = ctrl[i];
        if s.is_empty() {
            return None;
        }
        if s.matches(hash) && eq(i) {
            return Some(i);
        }
    }
    None
}

/// Insertion-candidate search. Keeps comparing ACTIVE slots past any
/// tombstone until an EMPTY slot proves the key absent, so a key stored
/// behind a tombstone is still reported as occupied.
///
/// Returns `None` only when the key is absent and the walk met neither an
/// EMPTY slot nor a tombstone, i.e. every slot is ACTIVE.
#[inline]
pub fn find_or_vacant<F>(ctrl: &[Sentinel], hash: u64, mut eq: F) -> Option<Candidate>
where
    F: FnMut(usize) -> bool,
{
    let mut first_tombstone = None;
    for i in ProbeSeq::new(hash, ctrl.len()) {
        let s = ctrl[i];
        if s.is_empty() {
            return Some(Candidate::Vacant(first_tombstone.unwrap_or(i)));
        }
        if s.is_deleted() {
            first_tombstone.get_or_insert(i);
            continue;
        }
        if s.matches(hash) && eq(i) {
            return Some(Candidate::Occupied(i));
        }
    }
    first_tombstone.map(Candidate::Vacant)
}

/// First non-ACTIVE slot on the chain. Used when placing entries into a
/// freshly built array, where keys are known to be unique.
#[inline]
pub fn first_open(ctrl: &[Sentinel], hash: u64) -> Option<usize> {
    ProbeSeq::new(hash, ctrl.len()).find(|&i| !ctrl[i].is_active())
}
