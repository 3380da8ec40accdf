//! # compact-heap
//!
//! A handle-based allocator over one fixed-size byte buffer, for places that
//! must sub-allocate from a single pre-reserved region (simulators, embedded
//! pools, custom runtimes) without a system allocator behind them.
//!
//! ```text
//!   ┌───┬───────┬──┬─────┬──────────────┐
//!   │ A │ free  │B │free │      C       │   buffer of N bytes
//!   └───┴───────┴──┴─────┴──────────────┘
//!     ▲           ▲         ▲
//!     │           │         │
//!   Handle(1)  Handle(2)  Handle(3)         allocation table
//! ```
//!
//! - **First-fit** allocation over a free list kept in release order
//! - **Coalescing** of adjacent free regions on every free
//! - **Compaction** when first-fit misses: live allocations are slid to the
//!   front of the buffer and the request is retried once
//! - **One lock** around the whole heap; every call is linearizable
//!
//! Callers never see raw addresses. A [`Handle`] is the only stable name for
//! an allocation, and its bytes are reached through
//! [`CompactHeap::with_bytes`], [`CompactHeap::read`] and friends.
//!
//! ```
//! use compact_heap::CompactHeap;
//!
//! let heap = CompactHeap::new(5);
//! let h1 = heap.alloc(2).expect("fits");
//! assert!(heap.alloc(4).is_none());
//!
//! heap.free(h1).unwrap();
//! assert!(heap.free(h1).is_err());
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub mod mm;

pub use error::HeapError;
pub use mm::{CompactHeap, Handle, HeapConfig, HeapStats, InvariantViolation, Region};
