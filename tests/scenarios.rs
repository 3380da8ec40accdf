//! End-to-end heap behaviour on small buffers

use compact_heap::{CompactHeap, Handle, HeapError, Region};
use test_env_log::test;

#[test]
fn test_alloc_free_coalesces_back_to_one_region() {
    let heap = CompactHeap::new(5);

    let h1 = heap.alloc(2).unwrap();
    let h2 = heap.alloc(3).unwrap();

    heap.free(h1).unwrap();
    assert_eq!(heap.free_regions(), [Region::new(0, 2)]);

    heap.free(h2).unwrap();
    assert_eq!(heap.free_regions(), [Region::new(0, 5)]);
    assert_eq!(heap.check_invariants(), Ok(()));
}

#[test]
fn test_full_heap_then_reuse() {
    let heap = CompactHeap::new(5);

    let h1 = heap.alloc(5).unwrap();
    assert_eq!(heap.alloc(1), None);

    heap.free(h1).unwrap();
    let h3 = heap.alloc(5).unwrap();
    assert_ne!(h1, h3);
    assert_eq!(heap.check_invariants(), Ok(()));
}

#[test]
fn test_fragmentation_triggers_compaction() {
    let heap = CompactHeap::new(5);
    let handles: Vec<Handle> = (0..5).map(|_| heap.alloc(1).unwrap()).collect();
    for (i, &h) in handles.iter().enumerate() {
        assert_eq!(heap.region_of(h), Some(Region::new(i, 1)));
        heap.write(h, 0, &[i as u8 + 1]).unwrap();
    }

    heap.free(handles[1]).unwrap();
    heap.free(handles[3]).unwrap();
    assert_eq!(heap.free_regions(), [Region::new(1, 1), Region::new(3, 1)]);

    let fresh = heap.alloc(2).unwrap();
    assert_eq!(heap.stats().compactions, 1);

    // Survivors packed in address order, contents moved with them
    for (expected_offset, &h) in [handles[0], handles[2], handles[4]].iter().enumerate() {
        assert_eq!(heap.region_of(h), Some(Region::new(expected_offset, 1)));
    }
    let mut byte = [0u8; 1];
    heap.read(handles[2], 0, &mut byte).unwrap();
    assert_eq!(byte, [3]);
    heap.read(handles[4], 0, &mut byte).unwrap();
    assert_eq!(byte, [5]);

    assert_eq!(heap.region_of(fresh), Some(Region::new(3, 2)));
    assert!(heap.free_regions().is_empty());
    assert_eq!(heap.check_invariants(), Ok(()));
}

#[test]
fn test_invalid_free_changes_nothing() {
    let heap = CompactHeap::new(5);
    let h1 = heap.alloc(2).unwrap();
    let h2 = heap.alloc(1).unwrap();
    heap.free(h1).unwrap();

    let free_before = heap.free_regions();
    let allocs_before = heap.allocations();

    // Already freed
    assert_eq!(heap.free(h1), Err(HeapError::InvalidHandle(h1)));
    // Never issued
    let bogus = Handle::from_raw(999);
    assert_eq!(heap.free(bogus), Err(HeapError::InvalidHandle(bogus)));
    // Zero is never issued either
    assert!(heap.free(Handle::from_raw(0)).is_err());

    assert_eq!(heap.free_regions(), free_before);
    assert_eq!(heap.allocations(), allocs_before);
    assert_eq!(heap.allocations(), [(h2, Region::new(2, 1))]);
    assert_eq!(heap.stats().invalid_frees, 3);
}

#[test]
fn test_single_alloc_round_trip() {
    let heap = CompactHeap::new(64);
    let before = heap.free_regions();

    let h = heap.alloc(17).unwrap();
    heap.free(h).unwrap();

    assert_eq!(heap.free_regions(), before);
}

#[test]
fn test_handles_never_reused() {
    let heap = CompactHeap::new(8);
    let mut seen = Vec::new();

    for _ in 0..32 {
        let h = heap.alloc(8).unwrap();
        assert!(seen.last().map_or(true, |&prev: &Handle| h > prev));
        seen.push(h);
        heap.free(h).unwrap();
    }
    assert_eq!(seen[0].as_u64(), 1);
}

#[test]
fn test_oversized_request_fails_once() {
    let heap = CompactHeap::new(5);
    let h = heap.alloc(3).unwrap();

    assert_eq!(heap.alloc(6), None);
    assert_eq!(heap.stats().compactions, 1);
    assert_eq!(heap.region_of(h), Some(Region::new(0, 3)));
    assert_eq!(heap.check_invariants(), Ok(()));
}

#[test]
fn test_mixed_workload_keeps_invariants() {
    let heap = CompactHeap::new(256);
    let mut live: Vec<(Handle, u8)> = Vec::new();

    // Deterministic pseudo-random sequence (xorshift)
    let mut x: u32 = 0x2545_f491;
    for step in 0..2000u32 {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;

        if x % 3 != 0 || live.is_empty() {
            let size = (x % 24 + 1) as usize;
            if let Some(h) = heap.alloc(size) {
                let tag = (step % 251) as u8;
                heap.with_bytes_mut(h, |bytes| bytes.fill(tag)).unwrap();
                live.push((h, tag));
            }
        } else {
            let (h, tag) = live.swap_remove(x as usize % live.len());
            heap.with_bytes(h, |bytes| assert!(bytes.iter().all(|&b| b == tag)))
                .unwrap();
            heap.free(h).unwrap();
        }

        assert_eq!(heap.check_invariants(), Ok(()));
    }

    // Every surviving allocation kept its contents across compactions
    for (h, tag) in live {
        heap.with_bytes(h, |bytes| assert!(bytes.iter().all(|&b| b == tag)))
            .unwrap();
    }
    assert!(heap.stats().compactions > 0);
}
