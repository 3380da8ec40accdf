//! Structural consistency checks
//!
//! Verifies that the free list and the allocation table together tile the
//! buffer exactly: no overlaps, no gaps, no empty free regions.

use super::free_list::FreeList;
use super::handle::{AllocationTable, Handle};
use super::region::Region;
use alloc::vec::Vec;
use core::fmt;

/// Which invariant a heap state broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A free region has zero length
    EmptyFreeRegion(Region),

    /// A region reaches past the end of the buffer
    OutOfBuffer { region: Region, capacity: usize },

    /// Two free regions share bytes
    FreeOverlap(Region, Region),

    /// Two allocations share bytes
    AllocationOverlap(Handle, Handle),

    /// An allocation shares bytes with a free region
    FreeAllocationOverlap { handle: Handle, free: Region },

    /// Free and allocated bytes do not add up to the capacity
    ByteCount {
        free: usize,
        allocated: usize,
        capacity: usize,
    },

    /// Some byte range is neither free nor allocated
    Gap { offset: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::EmptyFreeRegion(r) => write!(f, "Empty free region at {}", r),
            InvariantViolation::OutOfBuffer { region, capacity } => {
                write!(f, "Region {} exceeds buffer of {} bytes", region, capacity)
            }
            InvariantViolation::FreeOverlap(a, b) => {
                write!(f, "Free regions {} and {} overlap", a, b)
            }
            InvariantViolation::AllocationOverlap(a, b) => {
                write!(f, "Allocations {} and {} overlap", a, b)
            }
            InvariantViolation::FreeAllocationOverlap { handle, free } => {
                write!(f, "Allocation {} overlaps free region {}", handle, free)
            }
            InvariantViolation::ByteCount {
                free,
                allocated,
                capacity,
            } => write!(
                f,
                "Free ({}) + allocated ({}) bytes != capacity ({})",
                free, allocated, capacity
            ),
            InvariantViolation::Gap { offset } => write!(f, "Unaccounted bytes at offset {}", offset),
        }
    }
}

/// Either side of the tiling, tagged for error reporting
#[derive(Clone, Copy)]
enum Owner {
    Free,
    Allocated(Handle),
}

/// Check every structural invariant of a heap state
pub fn check(
    capacity: usize,
    free: &FreeList,
    table: &AllocationTable,
) -> Result<(), InvariantViolation> {
    let mut tiles: Vec<(Region, Owner)> = Vec::with_capacity(free.len() + table.len());

    for &region in free.regions() {
        if region.is_empty() {
            return Err(InvariantViolation::EmptyFreeRegion(region));
        }
        tiles.push((region, Owner::Free));
    }
    for (handle, region) in table.iter() {
        tiles.push((region, Owner::Allocated(handle)));
    }

    let free_bytes = free.total();
    let allocated = table.total();
    if free_bytes + allocated != capacity {
        return Err(InvariantViolation::ByteCount {
            free: free_bytes,
            allocated,
            capacity,
        });
    }

    // Sorted by offset, a valid tiling has every tile starting where the
    // previous one ended. Zero-length allocations are never issued, so the
    // sort key is unambiguous.
    tiles.sort_unstable_by_key(|(r, _)| (r.offset, r.len));

    let mut cursor = 0;
    let mut prev: Option<(Region, Owner)> = None;
    for (region, owner) in tiles {
        if region.end() > capacity {
            return Err(InvariantViolation::OutOfBuffer { region, capacity });
        }
        if region.offset > cursor {
            return Err(InvariantViolation::Gap { offset: cursor });
        }
        if region.offset < cursor {
            if let Some((prev_region, prev_owner)) = prev {
                return Err(overlap(prev_region, prev_owner, region, owner));
            }
        }
        cursor = region.end();
        prev = Some((region, owner));
    }

    if cursor != capacity {
        return Err(InvariantViolation::Gap { offset: cursor });
    }
    Ok(())
}

fn overlap(a: Region, a_owner: Owner, b: Region, b_owner: Owner) -> InvariantViolation {
    match (a_owner, b_owner) {
        (Owner::Free, Owner::Free) => InvariantViolation::FreeOverlap(a, b),
        (Owner::Allocated(x), Owner::Allocated(y)) => InvariantViolation::AllocationOverlap(x, y),
        (Owner::Allocated(handle), Owner::Free) => {
            InvariantViolation::FreeAllocationOverlap { handle, free: b }
        }
        (Owner::Free, Owner::Allocated(handle)) => {
            InvariantViolation::FreeAllocationOverlap { handle, free: a }
        }
    }
}
