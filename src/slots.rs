//! SlotArena: uninitialised slot storage paired with its sentinel array.
//!
//! Slot `i` holds a live `E` iff `ctrl[i]` is ACTIVE. Every state change
//! goes through this type, which keeps `active`/`deleted` counts in step with
//! the metadata and drops each constructed value exactly once. Unused slots
//! are never default-constructed.
//!
//! The sentinel byte is always flipped away from ACTIVE before a value is
//! read out or dropped, so a panicking `Drop` leaves the arena consistent
//! (the value is treated as gone).

use crate::sentinel::Sentinel;
use core::iter::FusedIterator;
use core::mem::{self, MaybeUninit};
use core::slice;

pub(crate) struct SlotArena<E> {
    ctrl: Box<[Sentinel]>,
    slots: Box<[MaybeUninit<E>]>,
    active: usize,
    deleted: usize,
}

impl<E> SlotArena<E> {
    /// `capacity` slots, all EMPTY.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            ctrl: vec![Sentinel::EMPTY; capacity].into_boxed_slice(),
            slots: core::iter::repeat_with(MaybeUninit::uninit)
                .take(capacity)
                .collect(),
            active: 0,
            deleted: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.ctrl.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.active
    }

    #[inline]
    pub(crate) fn tombstones(&self) -> usize {
        self.deleted
    }

    #[inline]
    pub(crate) fn ctrl(&self) -> &[Sentinel] {
        &self.ctrl
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> Option<&E> {
        if self.ctrl.get(i)?.is_active() {
            // SAFETY: ACTIVE sentinel means slot `i` was constructed and not yet taken.
            Some(unsafe { self.slots[i].assume_init_ref() })
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, i: usize) -> Option<&mut E> {
        if self.ctrl.get(i)?.is_active() {
            // SAFETY: as in `get`.
            Some(unsafe { self.slots[i].assume_init_mut() })
        } else {
            None
        }
    }

    /// Construct `value` in the non-ACTIVE slot `i` and mark it ACTIVE with
    /// the tag of `hash`.
    ///
    /// Panics if `i` is already ACTIVE.
    pub(crate) fn construct(&mut self, i: usize, hash: u64, value: E) -> &mut E {
        let s = self.ctrl[i];
        assert!(!s.is_active(), "construct into an occupied slot");
        if s.is_deleted() {
            self.deleted -= 1;
        }
        self.ctrl[i] = Sentinel::active(hash);
        self.active += 1;
        self.slots[i].write(value)
    }

    /// Move the value out of slot `i`, leaving a tombstone.
    pub(crate) fn take(&mut self, i: usize) -> Option<E> {
        if !self.ctrl.get(i)?.is_active() {
            return None;
        }
        self.ctrl[i] = Sentinel::DELETED;
        self.active -= 1;
        self.deleted += 1;
        // SAFETY: the slot was ACTIVE; its sentinel no longer is, so this
        // read is the only one.
        Some(unsafe { self.slots[i].assume_init_read() })
    }

    /// Drop every live value and reset all metadata to EMPTY. Capacity is kept.
    pub(crate) fn clear(&mut self) {
        self.deleted = 0;
        for i in 0..self.ctrl.len() {
            let was_active = self.ctrl[i].is_active();
            self.ctrl[i] = Sentinel::EMPTY;
            if was_active {
                self.active -= 1;
                // SAFETY: slot was ACTIVE and is now marked EMPTY, so it is
                // dropped exactly once.
                unsafe { self.slots[i].assume_init_drop() };
            }
        }
        debug_assert_eq!(self.active, 0);
    }

    pub(crate) fn iter(&self) -> Iter<'_, E> {
        Iter {
            ctrl: self.ctrl.iter(),
            slots: self.slots.iter(),
            remaining: self.active,
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, E> {
        IterMut {
            ctrl: self.ctrl.iter(),
            slots: self.slots.iter_mut(),
            remaining: self.active,
        }
    }

    /// Consume the arena, yielding live values in slot order.
    pub(crate) fn into_entries(self) -> IntoIter<E> {
        IntoIter {
            arena: self,
            next: 0,
        }
    }
}

impl<E: Clone> Clone for SlotArena<E> {
    fn clone(&self) -> Self {
        let mut out = SlotArena::new(self.capacity());
        for (i, &s) in self.ctrl.iter().enumerate() {
            if s.is_active() {
                // SAFETY: ACTIVE slot.
                let v = unsafe { self.slots[i].assume_init_ref() }.clone();
                out.slots[i].write(v);
                out.ctrl[i] = s;
                out.active += 1;
            } else if s.is_deleted() {
                out.ctrl[i] = s;
                out.deleted += 1;
            }
        }
        out
    }
}

impl<E> Drop for SlotArena<E> {
    fn drop(&mut self) {
        if mem::needs_drop::<E>() {
            self.clear();
        }
    }
}

/// Live entries of a [`SlotArena`] in slot order.
pub(crate) struct Iter<'a, E> {
    ctrl: slice::Iter<'a, Sentinel>,
    slots: slice::Iter<'a, MaybeUninit<E>>,
    remaining: usize,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    #[inline]
    fn next(&mut self) -> Option<&'a E> {
        loop {
            let s = self.ctrl.next()?;
            let slot = self.slots.next()?;
            if s.is_active() {
                self.remaining -= 1;
                // SAFETY: ACTIVE slot, shared borrow of the arena held for 'a.
                return Some(unsafe { slot.assume_init_ref() });
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> ExactSizeIterator for Iter<'_, E> {}
impl<E> FusedIterator for Iter<'_, E> {}

impl<E> Clone for Iter<'_, E> {
    fn clone(&self) -> Self {
        Iter {
            ctrl: self.ctrl.clone(),
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

pub(crate) struct IterMut<'a, E> {
    ctrl: slice::Iter<'a, Sentinel>,
    slots: slice::IterMut<'a, MaybeUninit<E>>,
    remaining: usize,
}

impl<'a, E> Iterator for IterMut<'a, E> {
    type Item = &'a mut E;

    #[inline]
    fn next(&mut self) -> Option<&'a mut E> {
        loop {
            let s = self.ctrl.next()?;
            let slot = self.slots.next()?;
            if s.is_active() {
                self.remaining -= 1;
                // SAFETY: ACTIVE slot; each slot is yielded at most once.
                return Some(unsafe { slot.assume_init_mut() });
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> ExactSizeIterator for IterMut<'_, E> {}
impl<E> FusedIterator for IterMut<'_, E> {}

/// Owning iterator; entries not yet yielded are dropped with the arena.
pub(crate) struct IntoIter<E> {
    arena: SlotArena<E>,
    next: usize,
}

impl<E> Iterator for IntoIter<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        while self.next < self.arena.capacity() {
            let i = self.next;
            self.next += 1;
            if let Some(v) = self.arena.take(i) {
                return Some(v);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.arena.len(), Some(self.arena.len()))
    }
}

impl<E> ExactSizeIterator for IntoIter<E> {}
impl<E> FusedIterator for IntoIter<E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct DropCounter(Rc<Cell<usize>>);
    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    /// Invariant: a fresh arena is all EMPTY with no live values.
    #[test]
    fn new_arena_is_empty() {
        let a: SlotArena<String> = SlotArena::new(8);
        assert_eq!(a.capacity(), 8);
        assert_eq!(a.len(), 0);
        assert_eq!(a.tombstones(), 0);
        assert!(a.ctrl().iter().all(|s| s.is_empty()));
        assert!(a.get(0).is_none());
        assert!(a.get(100).is_none());
    }

    /// Invariant: construct/take move the sentinel EMPTY -> ACTIVE -> DELETED and
    /// keep the counters in step; a tombstone may be constructed into again.
    #[test]
    fn construct_take_cycle() {
        let mut a: SlotArena<String> = SlotArena::new(4);
        a.construct(2, 0x85, "x".to_string());
        assert_eq!(a.ctrl()[2], Sentinel::active(0x85));
        assert_eq!(a.get(2).map(String::as_str), Some("x"));
        assert_eq!(a.len(), 1);

        assert_eq!(a.take(2).as_deref(), Some("x"));
        assert!(a.ctrl()[2].is_deleted());
        assert_eq!((a.len(), a.tombstones()), (0, 1));
        assert!(a.take(2).is_none());

        a.construct(2, 1, "y".to_string());
        assert_eq!((a.len(), a.tombstones()), (1, 0));
        *a.get_mut(2).unwrap() += "z";
        assert_eq!(a.get(2).map(String::as_str), Some("yz"));
    }

    #[test]
    #[should_panic(expected = "construct into an occupied slot")]
    fn construct_into_active_slot_panics() {
        let mut a: SlotArena<u32> = SlotArena::new(2);
        a.construct(0, 0, 1);
        a.construct(0, 0, 2);
    }

    /// Invariant: every constructed value is dropped exactly once across take,
    /// clear, into_entries, and the arena's own drop.
    #[test]
    fn values_dropped_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        let mut a = SlotArena::new(8);
        for i in 0..6 {
            a.construct(i, i as u64, DropCounter(drops.clone()));
        }
        drop(a.take(0));
        assert_eq!(drops.get(), 1);

        a.clear();
        assert_eq!(drops.get(), 6);
        assert!(a.ctrl().iter().all(|s| s.is_empty()));
        assert_eq!((a.len(), a.tombstones(), a.capacity()), (0, 0, 8));

        for i in 0..3 {
            a.construct(i, 0, DropCounter(drops.clone()));
        }
        let mut it = a.into_entries();
        drop(it.next());
        assert_eq!(drops.get(), 7);
        drop(it);
        assert_eq!(drops.get(), 9);

        let mut b = SlotArena::new(4);
        b.construct(3, 0, DropCounter(drops.clone()));
        drop(b);
        assert_eq!(drops.get(), 10);
    }

    #[test]
    fn iterators_visit_live_slots_in_order() {
        let mut a: SlotArena<u32> = SlotArena::new(6);
        a.construct(4, 0, 40);
        a.construct(1, 0, 10);
        a.construct(3, 0, 30);
        a.take(3);

        let it = a.iter();
        assert_eq!(it.len(), 2);
        assert_eq!(it.copied().collect::<Vec<_>>(), vec![10, 40]);

        for v in a.iter_mut() {
            *v += 1;
        }
        assert_eq!(a.into_entries().collect::<Vec<_>>(), vec![11, 41]);
    }

    /// Invariant: a clone reproduces the metadata byte for byte, including
    /// tombstones, with independent values.
    #[test]
    fn clone_copies_metadata_and_values() {
        let mut a: SlotArena<String> = SlotArena::new(4);
        a.construct(0, 7, "a".into());
        a.construct(1, 9, "b".into());
        a.take(1);
        let mut b = a.clone();
        assert_eq!(a.ctrl(), b.ctrl());
        assert_eq!((b.len(), b.tombstones()), (1, 1));
        b.get_mut(0).unwrap().push('!');
        assert_eq!(a.get(0).map(String::as_str), Some("a"));
        assert_eq!(b.get(0).map(String::as_str), Some("a!"));
    }
}
