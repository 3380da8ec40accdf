//! Free-space tracking
//!
//! The free list is kept in *historical* order: a released region is pushed
//! to the back and the list is only address-sorted as a side effect of
//! [`FreeList::coalesce`]. First-fit scans follow whatever order the list is
//! currently in, so between two frees the block picked for a request can
//! depend on release order rather than address order.

use super::region::Region;
use alloc::vec;
use alloc::vec::Vec;
use log::{debug, trace};

/// Unused regions of the heap buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeList {
    regions: Vec<Region>,
}

impl FreeList {
    /// Create a free list covering the whole buffer `[0, capacity)`
    ///
    /// A zero-capacity heap starts with no free regions at all.
    pub fn new(capacity: usize) -> Self {
        let regions = if capacity == 0 {
            Vec::new()
        } else {
            vec![Region::new(0, capacity)]
        };
        Self { regions }
    }

    /// Carve `size` bytes off the first region large enough to hold them
    ///
    /// The carved bytes are taken from the start of the chosen region. The
    /// remainder, if any, stays at the same list position; an exactly
    /// consumed region is removed.
    ///
    /// # Returns
    /// The carved region, or None if no single region is large enough.
    pub fn first_fit(&mut self, size: usize) -> Option<Region> {
        let idx = self.regions.iter().position(|r| r.len >= size)?;
        let found = self.regions[idx];
        let carved = Region::new(found.offset, size);

        if found.len == size {
            self.regions.remove(idx);
        } else {
            self.regions[idx] = Region::new(found.offset + size, found.len - size);
        }

        trace!("first-fit: {} bytes from free region {} -> {}", size, found, carved);
        Some(carved)
    }

    /// Return a region to the list (appended, not merged)
    pub fn release(&mut self, region: Region) {
        self.regions.push(region);
    }

    /// Sort by offset and merge address-contiguous neighbours
    ///
    /// Leaves the minimal set of maximal free regions. Running it on an
    /// already coalesced list changes nothing.
    pub fn coalesce(&mut self) {
        let before = self.regions.len();
        self.regions.sort_unstable_by_key(|r| r.offset);

        let mut merged: Vec<Region> = Vec::with_capacity(self.regions.len());
        for region in self.regions.drain(..) {
            match merged.last_mut() {
                Some(last) if last.is_followed_by(&region) => last.len += region.len,
                _ => merged.push(region),
            }
        }
        self.regions = merged;

        if self.regions.len() != before {
            debug!("coalesce: {} -> {} free regions", before, self.regions.len());
        }
    }

    /// Replace the whole list with the single tail region `[start, capacity)`
    ///
    /// Used after compaction has packed every allocation below `start`.
    pub fn reset_to_tail(&mut self, start: usize, capacity: usize) {
        self.regions.clear();
        if start < capacity {
            self.regions.push(Region::new(start, capacity - start));
        }
    }

    /// Regions in current list order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Total number of free bytes
    pub fn total(&self) -> usize {
        self.regions.iter().map(|r| r.len).sum()
    }

    /// Length of the largest single free region (0 if none)
    pub fn largest(&self) -> usize {
        self.regions.iter().map(|r| r.len).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
