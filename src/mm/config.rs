//! Heap construction options

/// Construction-time heap options
///
/// All options are fixed once the heap is built; the buffer never grows or
/// shrinks.
///
/// # Example
/// ```
/// use compact_heap::{CompactHeap, HeapConfig};
///
/// let heap = CompactHeap::with_config(HeapConfig::new(4096).without_compaction());
/// assert_eq!(heap.capacity(), 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Size of the backing buffer in bytes
    pub capacity: usize,

    /// Run one compaction pass and retry when first-fit finds no region
    ///
    /// When false, a first-fit miss is reported as "no space" right away.
    pub compact_on_exhaustion: bool,

    /// Zero-fill the bytes of every new allocation
    ///
    /// Freed bytes are not scrubbed, so without this a new allocation may
    /// observe what a previous owner left behind.
    pub zero_on_alloc: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl HeapConfig {
    /// Capacity used by `HeapConfig::default()` (64 KiB)
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    /// Options for a heap of `capacity` bytes with compaction and zero-fill enabled
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            compact_on_exhaustion: true,
            zero_on_alloc: true,
        }
    }

    /// Disable the compaction fallback
    pub const fn without_compaction(mut self) -> Self {
        self.compact_on_exhaustion = false;
        self
    }

    /// Keep stale bytes in new allocations instead of zero-filling them
    pub const fn without_zeroing(mut self) -> Self {
        self.zero_on_alloc = false;
        self
    }
}
