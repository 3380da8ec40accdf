//! Heap errors
//!
//! Running out of space is *not* an error: `alloc` reports it as `None`.
//! The variants here describe caller misuse of a handle.

use crate::mm::Handle;
use core::fmt;

/// Errors returned by handle-based heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// Handle was never issued by this heap, or has already been freed
    InvalidHandle(Handle),

    /// Byte access reaches outside the allocation
    OutOfBounds {
        /// Handle being accessed
        handle: Handle,

        /// Requested start within the allocation
        offset: usize,

        /// Requested number of bytes
        len: usize,

        /// Size of the allocation
        size: usize,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::InvalidHandle(h) => write!(f, "Invalid handle {}", h),
            HeapError::OutOfBounds {
                handle,
                offset,
                len,
                size,
            } => write!(
                f,
                "Access of {} bytes at offset {} exceeds allocation {} of {} bytes",
                len, offset, handle, size
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn test_heap_error_display() {
        let err = HeapError::InvalidHandle(Handle::from_raw(7));
        assert_eq!(format!("{}", err), "Invalid handle #7");

        let err = HeapError::OutOfBounds {
            handle: Handle::from_raw(2),
            offset: 3,
            len: 4,
            size: 5,
        };
        assert_eq!(
            format!("{}", err),
            "Access of 4 bytes at offset 3 exceeds allocation #2 of 5 bytes"
        );
    }
}
