//! One-byte slot metadata.
//!
//! Layout of the byte:
//! - `0b0ttt_tttt`: ACTIVE, low seven bits are the hash tag.
//! - `0x80`: EMPTY, never written since the metadata array was built.
//! - `0x81`: DELETED, a tombstone left by erase.
//!
//! A tag match is a pre-filter only. Seven bits collide often; a match must
//! always be confirmed with a full key comparison.

use core::fmt;

const HIGH_BIT: u8 = 0x80;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Sentinel(u8);

impl Sentinel {
    pub const EMPTY: Sentinel = Sentinel(0x80);
    pub const DELETED: Sentinel = Sentinel(0x81);
    pub const TAG_MASK: u8 = 0x7f;

    /// ACTIVE sentinel carrying the low seven bits of `hash`.
    #[inline]
    pub const fn active(hash: u64) -> Self {
        Sentinel(hash as u8 & Self::TAG_MASK)
    }

    #[inline]
    pub const fn is_active(self) -> bool {
        self.0 & HIGH_BIT == 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == Self::EMPTY.0
    }

    #[inline]
    pub const fn is_deleted(self) -> bool {
        self.0 == Self::DELETED.0
    }

    /// True when this is an ACTIVE byte whose tag equals the low seven bits
    /// of `hash`. EMPTY and DELETED never match since their high bit is set.
    #[inline]
    pub const fn matches(self, hash: u64) -> bool {
        self.0 == hash as u8 & Self::TAG_MASK
    }

    /// Hash tag of an ACTIVE byte.
    #[inline]
    pub const fn tag(self) -> Option<u8> {
        if self.is_active() {
            Some(self.0)
        } else {
            None
        }
    }

    #[inline]
    pub const fn as_byte(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Some(tag) => write!(f, "Active({tag:#04x})"),
            None if self.is_empty() => f.write_str("Empty"),
            None => f.write_str("Deleted"),
        }
    }
}
