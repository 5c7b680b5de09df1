//! The region provider abstraction: the external component responsible for growing the
//! managed address range and reporting its current bounds.
//!
//! The CORE heap never talks to the operating system directly; it only ever goes through this
//! trait, which is what lets the same [`crate::heap::Heap`] run unmodified against a real
//! process heap in production and a `Vec`-backed stand-in under test.

use crate::addr::BlockAddr;
use crate::error::RegionError;

/// Grows a contiguous byte region on demand and reports its current bounds.
pub trait RegionProvider {
    /// Extends the region by `n` bytes, returning the address of the first newly-added byte.
    /// `n` may be zero, in which case the call is a pure bounds query and must not fail.
    fn sbrk(&mut self, n: u64) -> Result<BlockAddr, RegionError>;

    /// Lowest address currently in the region.
    fn heap_lo(&self) -> BlockAddr;

    /// Highest address currently in the region (inclusive).
    fn heap_hi(&self) -> BlockAddr;
}

#[cfg(any(test, feature = "std"))]
pub use vec_region::VecRegion;

#[cfg(any(test, feature = "std"))]
mod vec_region {
    use std::vec::Vec;

    use super::RegionProvider;
    use crate::addr::BlockAddr;
    use crate::error::RegionError;

    /// A `Vec`-backed [`RegionProvider`] for tests and host-process embeddings.
    ///
    /// `sbrk` grows the region by extending a fixed-capacity buffer. The capacity is reserved
    /// up front and never exceeded, so growth never relocates the buffer out from under
    /// addresses the heap has already handed out; once `capacity` is reached, `sbrk` reports
    /// [`RegionError::Exhausted`] instead of reallocating.
    pub struct VecRegion {
        storage: Vec<u8>,
        len: usize,
    }

    impl VecRegion {
        /// Creates a region that can grow up to `capacity` bytes without ever relocating.
        #[must_use]
        pub fn with_capacity(capacity: usize) -> Self {
            Self {
                storage: Vec::with_capacity(capacity),
                len: 0,
            }
        }

        fn base(&self) -> BlockAddr {
            BlockAddr::from_ptr(self.storage.as_ptr())
        }
    }

    impl Default for VecRegion {
        fn default() -> Self {
            Self::with_capacity(64 * 1024 * 1024)
        }
    }

    impl RegionProvider for VecRegion {
        fn sbrk(&mut self, n: u64) -> Result<BlockAddr, RegionError> {
            let n = usize::try_from(n).map_err(|_| RegionError::Overflow)?;
            let new_len = self.len.checked_add(n).ok_or(RegionError::Overflow)?;
            if new_len > self.storage.capacity() {
                return Err(RegionError::Exhausted);
            }

            let addr = self.base() + self.len;
            self.storage.resize(new_len, 0);
            self.len = new_len;
            Ok(addr)
        }

        fn heap_lo(&self) -> BlockAddr {
            self.base()
        }

        fn heap_hi(&self) -> BlockAddr {
            self.base() + self.len.saturating_sub(1)
        }
    }
}
