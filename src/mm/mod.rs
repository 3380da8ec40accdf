//! Memory management
//!
//! Free-space tracking, handle issuance, compaction and the locked heap that
//! ties them together.

pub mod compactor;
pub mod config;
pub mod free_list;
pub mod handle;
pub mod heap;
pub mod invariants;
pub mod region;

// Re-export for convenience
pub use compactor::CompactionReport;
pub use config::HeapConfig;
pub use handle::Handle;
pub use heap::{CompactHeap, HeapStats};
pub use invariants::InvariantViolation;
pub use region::Region;
