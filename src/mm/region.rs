//! Byte ranges inside the heap buffer

use core::fmt;

/// A contiguous byte range `[offset, offset + len)` of the heap buffer
///
/// Regions handed out by the public API are snapshots. The offset is only
/// meaningful until the next `alloc` or `free` on the same heap, since
/// compaction may move any live allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Region {
    /// Start of the range (byte index into the buffer)
    pub offset: usize,

    /// Number of bytes in the range
    pub len: usize,
}

impl Region {
    /// Create a region starting at `offset` spanning `len` bytes
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last byte of the region
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if `other` starts exactly where `self` ends
    pub const fn is_followed_by(&self, other: &Region) -> bool {
        self.end() == other.offset
    }

    /// True if the two regions share at least one byte
    pub const fn overlaps(&self, other: &Region) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.offset < other.end()
            && other.offset < self.end()
    }

    /// Byte range usable for slicing the backing buffer
    pub(crate) const fn range(&self) -> core::ops::Range<usize> {
        self.offset..self.end()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.offset, self.end())
    }
}
