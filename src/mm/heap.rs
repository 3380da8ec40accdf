//! Handle-based compacting heap over a fixed buffer
//!
//! `CompactHeap` owns one byte buffer and hands out [`Handle`]s instead of
//! addresses. All state (buffer, free list, allocation table) sits behind a
//! single spinlock, so every public call is one atomic transition of the heap:
//!
//! ```text
//!   alloc(size)                         free(handle)
//!       │                                   │
//!       ▼                                   ▼
//!   lock ──► first-fit ──hit──► record   lock ──► table.remove ──miss──► InvalidHandle
//!               │                                   │
//!              miss                                 ▼
//!               ▼                              free.release
//!           compact ──► first-fit ──► record        │
//!                           │                       ▼
//!                          miss ──► None        coalesce
//! ```
//!
//! Offsets are never part of the contract. Compaction may move any live
//! allocation, so bytes are only reachable through a handle, resolved again
//! under the lock on every call.

use super::compactor::{self, CompactionReport};
use super::config::HeapConfig;
use super::free_list::FreeList;
use super::handle::{AllocationTable, Handle};
use super::invariants::{self, InvariantViolation};
use super::region::Region;
use crate::error::HeapError;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use log::{debug, warn};
use spin::Mutex;

/// Everything guarded by the heap lock
struct HeapState {
    buffer: Vec<u8>,
    free: FreeList,
    table: AllocationTable,
}

impl HeapState {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity],
            free: FreeList::new(capacity),
            table: AllocationTable::new(),
        }
    }

    /// One first-fit attempt; records the allocation on success
    fn try_alloc(&mut self, size: usize, zero: bool) -> Option<Handle> {
        let region = self.free.first_fit(size)?;
        if zero {
            self.buffer[region.range()].fill(0);
        }
        Some(self.table.insert(region))
    }

    fn compact(&mut self) -> CompactionReport {
        compactor::compact(&mut self.buffer, &mut self.table, &mut self.free)
    }

    fn check(&self) -> Result<(), InvariantViolation> {
        invariants::check(self.buffer.len(), &self.free, &self.table)
    }

    /// Resolve `[offset, offset + len)` inside the allocation behind `handle`
    fn span(&self, handle: Handle, offset: usize, len: usize) -> Result<Region, HeapError> {
        let region = self
            .table
            .get(handle)
            .ok_or(HeapError::InvalidHandle(handle))?;

        match offset.checked_add(len) {
            Some(end) if end <= region.len => Ok(Region::new(region.offset + offset, len)),
            _ => Err(HeapError::OutOfBounds {
                handle,
                offset,
                len,
                size: region.len,
            }),
        }
    }
}

/// Compacting first-fit heap addressed by handles
///
/// # Example
/// ```
/// use compact_heap::CompactHeap;
///
/// let heap = CompactHeap::new(5);
/// let h1 = heap.alloc(2).unwrap();
/// let h2 = heap.alloc(3).unwrap();
///
/// heap.write(h2, 0, b"abc").unwrap();
/// heap.free(h1).unwrap();
///
/// let mut out = [0u8; 3];
/// heap.read(h2, 0, &mut out).unwrap();
/// assert_eq!(&out, b"abc");
/// ```
pub struct CompactHeap {
    config: HeapConfig,
    state: Mutex<HeapState>,

    /// Statistics (readable without taking the lock)
    alloc_count: AtomicUsize,
    free_count: AtomicUsize,
    alloc_failures: AtomicUsize,
    invalid_frees: AtomicUsize,
    compactions: AtomicUsize,
    bytes_moved: AtomicUsize,
}

impl CompactHeap {
    /// Create a heap over a zeroed buffer of `capacity` bytes with default options
    pub fn new(capacity: usize) -> Self {
        Self::with_config(HeapConfig::new(capacity))
    }

    /// Create a heap from explicit options
    pub fn with_config(config: HeapConfig) -> Self {
        debug!(
            "heap: {} bytes, compaction {}, zero-fill {}",
            config.capacity,
            if config.compact_on_exhaustion { "on" } else { "off" },
            if config.zero_on_alloc { "on" } else { "off" }
        );

        Self {
            config,
            state: Mutex::new(HeapState::new(config.capacity)),
            alloc_count: AtomicUsize::new(0),
            free_count: AtomicUsize::new(0),
            alloc_failures: AtomicUsize::new(0),
            invalid_frees: AtomicUsize::new(0),
            compactions: AtomicUsize::new(0),
            bytes_moved: AtomicUsize::new(0),
        }
    }

    /// Allocate `size` contiguous bytes
    ///
    /// Tries first-fit over the free list in its current order. On a miss the
    /// heap is compacted once (unless disabled in [`HeapConfig`]) and the
    /// same scan is retried exactly once.
    ///
    /// # Returns
    /// A fresh handle, or None if the request cannot be satisfied (including
    /// `size == 0`). Running out of space is an ordinary outcome; callers are
    /// expected to check for it.
    pub fn alloc(&self, size: usize) -> Option<Handle> {
        if size == 0 {
            debug!("alloc: rejecting zero-sized request");
            self.alloc_failures.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let zero = self.config.zero_on_alloc;
        let mut state = self.state.lock();

        let handle = match state.try_alloc(size, zero) {
            Some(handle) => Some(handle),
            None if self.config.compact_on_exhaustion => {
                debug!("alloc: first-fit miss for {} bytes, compacting", size);
                let report = state.compact();
                self.compactions.fetch_add(1, Ordering::Relaxed);
                self.bytes_moved
                    .fetch_add(report.bytes_moved, Ordering::Relaxed);
                state.try_alloc(size, zero)
            }
            None => None,
        };

        debug_assert_eq!(state.check(), Ok(()));

        match handle {
            Some(_) => {
                self.alloc_count.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                warn!(
                    "alloc: no space for {} bytes ({} free, largest region {})",
                    size,
                    state.free.total(),
                    state.free.largest()
                );
                self.alloc_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        handle
    }

    /// Release a live allocation
    ///
    /// The region is appended to the free list, which is then coalesced.
    ///
    /// # Returns
    /// `HeapError::InvalidHandle` if the handle was never issued or is already
    /// freed. The heap is left untouched in that case.
    pub fn free(&self, handle: Handle) -> Result<(), HeapError> {
        let mut state = self.state.lock();

        let region = match state.table.remove(handle) {
            Some(region) => region,
            None => {
                warn!("free: handle {} is not live", handle);
                self.invalid_frees.fetch_add(1, Ordering::Relaxed);
                return Err(HeapError::InvalidHandle(handle));
            }
        };

        debug!("free: {} releases {}", handle, region);
        state.free.release(region);
        state.free.coalesce();

        debug_assert_eq!(state.check(), Ok(()));
        self.free_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Run `f` over the bytes of a live allocation
    ///
    /// The slice borrows the heap lock, so it cannot outlive the call and
    /// cannot observe a concurrent compaction.
    pub fn with_bytes<R>(&self, handle: Handle, f: impl FnOnce(&[u8]) -> R) -> Result<R, HeapError> {
        let state = self.state.lock();
        let region = state
            .table
            .get(handle)
            .ok_or(HeapError::InvalidHandle(handle))?;
        Ok(f(&state.buffer[region.range()]))
    }

    /// Run `f` over the bytes of a live allocation, mutably
    pub fn with_bytes_mut<R>(
        &self,
        handle: Handle,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> Result<R, HeapError> {
        let mut state = self.state.lock();
        let region = state
            .table
            .get(handle)
            .ok_or(HeapError::InvalidHandle(handle))?;
        Ok(f(&mut state.buffer[region.range()]))
    }

    /// Copy `data` into the allocation starting at `offset`
    pub fn write(&self, handle: Handle, offset: usize, data: &[u8]) -> Result<(), HeapError> {
        let mut state = self.state.lock();
        let span = state.span(handle, offset, data.len())?;
        state.buffer[span.range()].copy_from_slice(data);
        Ok(())
    }

    /// Fill `out` from the allocation starting at `offset`
    pub fn read(&self, handle: Handle, offset: usize, out: &mut [u8]) -> Result<(), HeapError> {
        let state = self.state.lock();
        let span = state.span(handle, offset, out.len())?;
        out.copy_from_slice(&state.buffer[span.range()]);
        Ok(())
    }

    /// Size in bytes of a live allocation
    pub fn size_of(&self, handle: Handle) -> Option<usize> {
        self.state.lock().table.get(handle).map(|r| r.len)
    }

    /// Current region of a live allocation
    ///
    /// This is a snapshot for diagnostics. The offset goes stale as soon as
    /// another `alloc` or `free` runs on this heap.
    pub fn region_of(&self, handle: Handle) -> Option<Region> {
        self.state.lock().table.get(handle)
    }

    /// Snapshot of the free list in its current (scan) order
    pub fn free_regions(&self) -> Vec<Region> {
        self.state.lock().free.regions().to_vec()
    }

    /// Snapshot of all live allocations, in handle order
    pub fn allocations(&self) -> Vec<(Handle, Region)> {
        self.state.lock().table.iter().collect()
    }

    /// Total buffer size in bytes
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Bytes held by live allocations
    pub fn used(&self) -> usize {
        self.state.lock().table.total()
    }

    /// Free bytes (possibly fragmented)
    pub fn available(&self) -> usize {
        self.state.lock().free.total()
    }

    /// Length of the largest free region, i.e. the biggest request first-fit
    /// can serve without compacting
    pub fn largest_free_region(&self) -> usize {
        self.state.lock().free.largest()
    }

    /// Number of live allocations
    pub fn live_count(&self) -> usize {
        self.state.lock().table.len()
    }

    /// Options the heap was built with
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Verify that free and allocated regions tile the buffer exactly
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.state.lock().check()
    }

    /// Get heap statistics
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            alloc_count: self.alloc_count.load(Ordering::Relaxed),
            free_count: self.free_count.load(Ordering::Relaxed),
            alloc_failures: self.alloc_failures.load(Ordering::Relaxed),
            invalid_frees: self.invalid_frees.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
            bytes_moved: self.bytes_moved.load(Ordering::Relaxed),
        }
    }
}

/// Heap statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Successful allocations
    pub alloc_count: usize,

    /// Successful frees
    pub free_count: usize,

    /// Allocations that returned None
    pub alloc_failures: usize,

    /// Frees rejected with `InvalidHandle`
    pub invalid_frees: usize,

    /// Compaction passes run
    pub compactions: usize,

    /// Bytes relocated by compaction
    pub bytes_moved: usize,
}
