//! Hash dispersion: integer finalizers, avalanche mixing, a seed combiner,
//! and the capped FNV-1a byte hash. `DispersionState` wires them into
//! `core::hash` so any `K: Hash` gets a table hash without extra glue.
//!
//! Byte sequences hash on at most their first [`BYTE_HASH_LIMIT`] bytes.
//! Keys that only differ past that prefix collide and are told apart by
//! `Eq` alone; long keys with shared prefixes therefore probe further.

use core::hash::{BuildHasher, Hash, Hasher};

/// Number of leading bytes of a byte sequence that take part in hashing.
pub const BYTE_HASH_LIMIT: usize = 64;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 32-bit murmur3 finalizer.
#[inline]
pub const fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// 64-bit murmur3 finalizer.
#[inline]
pub const fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// Finalizer matched to the pointer width, for `usize` scalars and addresses.
#[cfg(target_pointer_width = "64")]
#[inline]
pub const fn finalize(x: usize) -> usize {
    fmix64(x as u64) as usize
}

/// Finalizer matched to the pointer width, for `usize` scalars and addresses.
#[cfg(not(target_pointer_width = "64"))]
#[inline]
pub const fn finalize(x: usize) -> usize {
    fmix32(x as u32) as usize
}

/// Avalanche mix (splitmix64 output stage). Bijective on `u64`.
#[inline]
pub const fn distribute(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Rotate `x` left by `r` bits.
#[inline]
pub const fn rotl(x: u64, r: u32) -> u64 {
    x.rotate_left(r)
}

/// Fold `value` into `seed`. Order matters: `combine(combine(s, a), b)`
/// differs from `combine(combine(s, b), a)` for almost all inputs.
#[inline]
pub const fn combine(seed: u64, value: u64) -> u64 {
    rotl(seed, u64::BITS / 3) ^ distribute(value)
}

/// FNV-1a over at most the first [`BYTE_HASH_LIMIT`] bytes of `bytes`.
#[inline]
pub fn fnv1a_capped(bytes: &[u8]) -> u64 {
    let take = bytes.len().min(BYTE_HASH_LIMIT);
    bytes[..take].iter().fold(FNV_OFFSET, |h, &b| {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash `value` with the default [`DispersionState`].
#[inline]
pub fn hash_one<T: ?Sized + Hash>(value: &T) -> u64 {
    DispersionState.hash_one(value)
}

/// Streaming hasher behind [`DispersionState`].
///
/// Every `write_*` call folds one component into the running state with
/// [`combine`]: integers go through [`fmix64`], byte runs through
/// [`fnv1a_capped`]. A pair `(a, b)` thus hashes as
/// `combine(combine(0, h(a)), h(b))`.
#[derive(Clone, Debug, Default)]
pub struct DispersionHasher {
    state: u64,
}

impl DispersionHasher {
    #[inline]
    fn fold(&mut self, component: u64) {
        self.state = combine(self.state, component);
    }
}

impl Hasher for DispersionHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.fold(fnv1a_capped(bytes));
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.fold(fmix64(u64::from(i)));
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.fold(fmix64(u64::from(i)));
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.fold(fmix64(u64::from(i)));
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.fold(fmix64(i));
    }

    #[inline]
    fn write_u128(&mut self, i: u128) {
        self.fold(fmix64(i as u64));
        self.fold(fmix64((i >> 64) as u64));
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.fold(finalize(i) as u64);
    }
}

/// Deterministic `BuildHasher` used by default in both containers. No
/// per-process seed: a given key always lands on the same probe start for
/// a given capacity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispersionState;

impl BuildHasher for DispersionState {
    type Hasher = DispersionHasher;

    #[inline]
    fn build_hasher(&self) -> DispersionHasher {
        DispersionHasher::default()
    }
}
