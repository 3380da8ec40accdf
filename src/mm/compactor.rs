//! Compaction (defragmentation)
//!
//! Slides every live allocation towards offset 0 so that all free bytes end
//! up in a single tail region:
//!
//! ```text
//!   before:  [A][ ][B][ ][C][    ]
//!   after:   [A][B][C][          ]
//! ```
//!
//! Allocations keep their relative *address* order, not their issue order.
//! Because allocations are visited in ascending offset and the destination
//! never exceeds the source, each move only ever copies downwards and never
//! clobbers an allocation that has not been moved yet.

use super::free_list::FreeList;
use super::handle::AllocationTable;
use log::debug;

/// Outcome of one compaction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionReport {
    /// Allocations whose offset changed
    pub moved: usize,

    /// Bytes copied inside the buffer
    pub bytes_moved: usize,

    /// Offset where the packed allocations end (start of the free tail)
    pub packed_end: usize,
}

/// Pack all live allocations from offset 0 and collapse the free list
///
/// Must be called with exclusive access to all three structures; the heap
/// only calls it while holding its lock.
pub fn compact(
    buffer: &mut [u8],
    table: &mut AllocationTable,
    free: &mut FreeList,
) -> CompactionReport {
    let mut report = CompactionReport::default();
    let mut next = 0;

    for (handle, region) in table.by_address() {
        debug_assert!(
            region.offset >= next,
            "allocation {} at {} overlaps packed prefix ending at {}",
            handle,
            region,
            next
        );

        if region.offset != next {
            buffer.copy_within(region.range(), next);
            table.relocate(handle, next);
            report.moved += 1;
            report.bytes_moved += region.len;
        }
        next += region.len;
    }

    report.packed_end = next;
    free.reset_to_tail(next, buffer.len());

    debug!(
        "compact: moved {} allocations ({} bytes), free tail starts at {}",
        report.moved, report.bytes_moved, report.packed_end
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::region::Region;
    use alloc::vec;

    #[test]
    fn test_compact_packs_in_address_order() {
        let mut buffer = vec![0u8; 8];
        let mut table = AllocationTable::new();
        let mut free = FreeList::new(8);

        // Issue order differs from address order on purpose
        let late = table.insert(Region::new(5, 2));
        let early = table.insert(Region::new(1, 2));
        buffer[5..7].copy_from_slice(b"cd");
        buffer[1..3].copy_from_slice(b"ab");
        free.reset_to_tail(8, 8);
        free.release(Region::new(0, 1));
        free.release(Region::new(3, 2));
        free.release(Region::new(7, 1));

        let report = compact(&mut buffer, &mut table, &mut free);

        assert_eq!(table.get(early), Some(Region::new(0, 2)));
        assert_eq!(table.get(late), Some(Region::new(2, 2)));
        assert_eq!(&buffer[0..4], b"abcd");
        assert_eq!(free.regions(), &[Region::new(4, 4)]);
        assert_eq!(
            report,
            CompactionReport {
                moved: 2,
                bytes_moved: 4,
                packed_end: 4,
            }
        );
    }

    #[test]
    fn test_compact_already_packed_moves_nothing() {
        let mut buffer = vec![0u8; 4];
        let mut table = AllocationTable::new();
        let mut free = FreeList::new(4);

        table.insert(free.first_fit(2).unwrap());
        table.insert(free.first_fit(2).unwrap());

        let report = compact(&mut buffer, &mut table, &mut free);

        assert_eq!(report.moved, 0);
        assert_eq!(report.packed_end, 4);
        assert!(free.is_empty());
    }

    #[test]
    fn test_compact_empty_table_frees_everything() {
        let mut buffer = vec![0u8; 6];
        let mut table = AllocationTable::new();
        let mut free = FreeList::new(6);
        free.reset_to_tail(6, 6);
        free.release(Region::new(3, 3));
        free.release(Region::new(0, 3));

        compact(&mut buffer, &mut table, &mut free);

        assert_eq!(free.regions(), &[Region::new(0, 6)]);
    }
}
