//! StableList: append-only storage whose elements never move.
//!
//! Elements live in chunks of doubling capacity (16, 32, 64, ...). A chunk
//! is allocated once at its final size and is never pushed past it, so its
//! buffer is never reallocated; only the small outer vector of chunk headers
//! grows. `push` takes `&self` and hands back a reference that stays valid
//! for as long as the list is borrowed, across any number of later pushes.
//!
//! Single-threaded: the interior mutability makes the list `!Sync`.

use core::cell::{Cell, UnsafeCell};
use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;

const FIRST_CHUNK: usize = 16;

/// Chunk number and offset within it for element `index`.
#[inline]
fn locate(index: usize) -> (usize, usize) {
    let n = index / FIRST_CHUNK + 1;
    let chunk = (usize::BITS - 1 - n.leading_zeros()) as usize;
    let start = FIRST_CHUNK * ((1 << chunk) - 1);
    (chunk, index - start)
}

pub struct StableList<T> {
    chunks: UnsafeCell<Vec<Vec<T>>>,
    len: Cell<usize>,
}

impl<T> StableList<T> {
    pub const fn new() -> Self {
        Self {
            chunks: UnsafeCell::new(Vec::new()),
            len: Cell::new(0),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len.get()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `value` and return a reference to it in its final location.
    pub fn push(&self, value: T) -> &T {
        let (chunk, offset) = locate(self.len());
        // SAFETY: no other reference to the outer vector is alive: `get`
        // and `iter` only hold one for the duration of a single lookup, and
        // nothing in this block calls back into user code. References handed
        // out earlier point into chunk buffers, which the pushes below never
        // reallocate (each chunk stays within the capacity it was created with).
        let chunks = unsafe { &mut *self.chunks.get() };
        if chunk == chunks.len() {
            chunks.push(Vec::with_capacity(FIRST_CHUNK << chunk));
        }
        let target = &mut chunks[chunk];
        debug_assert_eq!(target.len(), offset);
        debug_assert!(target.len() < target.capacity());
        target.push(value);
        self.len.set(self.len() + 1);
        let stored: *const T = &target[offset];
        // SAFETY: the element is never moved or dropped while `self` lives.
        unsafe { &*stored }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        let (chunk, offset) = locate(index);
        // SAFETY: shared access only, no `push` can run concurrently on a
        // single thread while this borrow is alive.
        let chunks = unsafe { &*self.chunks.get() };
        chunks.get(chunk)?.get(offset)
    }

    /// Elements in insertion order. Elements pushed after the iterator was
    /// created are not visited.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: 0,
            end: self.len(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.chunks.into_inner() {
            out.extend(chunk);
        }
        out
    }
}

impl<T> Default for StableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for StableList<T> {
    fn clone(&self) -> Self {
        let out = StableList::new();
        for v in self.iter() {
            out.push(v.clone());
        }
        out
    }
}

impl<T: fmt::Debug> fmt::Debug for StableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<usize> for StableList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!(
                "index {index} out of bounds for StableList of length {}",
                self.len()
            ),
        }
    }
}

impl<T> Extend<T> for StableList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl<T> FromIterator<T> for StableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = StableList::new();
        list.extend(iter);
        list
    }
}

/// Iterator over a [`StableList`] in insertion order.
pub struct Iter<'a, T> {
    list: &'a StableList<T>,
    next: usize,
    end: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.next == self.end {
            return None;
        }
        let v = self.list.get(self.next);
        self.next += 1;
        v
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.next;
        (n, Some(n))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a StableList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
