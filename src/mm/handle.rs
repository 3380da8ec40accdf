//! Handles and the allocation table
//!
//! A [`Handle`] is the only stable name for a live allocation. The table maps
//! it to the allocation's current region, which the compactor is free to
//! rewrite.

use super::region::Region;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

/// Opaque identifier of a live allocation
///
/// Handles are issued from 1 upwards and never reused by the heap that
/// issued them, even after the allocation is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub(crate) u64);

impl Handle {
    /// Rebuild a handle from its raw value (e.g. one passed across an FFI boundary)
    ///
    /// A handle built this way is only valid if the heap actually issued it
    /// and it has not been freed; otherwise operations report
    /// `HeapError::InvalidHandle`.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw integer value of the handle
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live allocations keyed by handle
#[derive(Debug, Clone)]
pub struct AllocationTable {
    entries: BTreeMap<Handle, Region>,

    /// Next handle value to issue (starts at 1, never decreases)
    next_handle: u64,
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationTable {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_handle: 1,
        }
    }

    /// Record a new allocation and issue its handle
    pub fn insert(&mut self, region: Region) -> Handle {
        let handle = Handle(self.next_handle);
        self.next_handle += 1;
        self.entries.insert(handle, region);
        handle
    }

    /// Remove a live allocation, returning the region it occupied
    pub fn remove(&mut self, handle: Handle) -> Option<Region> {
        self.entries.remove(&handle)
    }

    pub fn get(&self, handle: Handle) -> Option<Region> {
        self.entries.get(&handle).copied()
    }

    /// Move an allocation to a new offset (length is unchanged)
    pub(crate) fn relocate(&mut self, handle: Handle, offset: usize) {
        if let Some(region) = self.entries.get_mut(&handle) {
            region.offset = offset;
        }
    }

    /// Live entries sorted by their current offset
    pub fn by_address(&self) -> Vec<(Handle, Region)> {
        let mut entries: Vec<(Handle, Region)> =
            self.entries.iter().map(|(&h, &r)| (h, r)).collect();
        entries.sort_unstable_by_key(|&(_, r)| r.offset);
        entries
    }

    /// Live entries in handle order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, Region)> + '_ {
        self.entries.iter().map(|(&h, &r)| (h, r))
    }

    /// Total number of allocated bytes
    pub fn total(&self) -> usize {
        self.entries.values().map(|r| r.len).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
