//! Error types for the heap allocator.
//!
//! The public allocate/free surface (see [`crate::heap`]) follows the `malloc`/`free` calling
//! convention and reports failure as a null pointer, not a `Result`. These types exist for the
//! layers underneath it — the region provider and the heap checker — where a `Result` is the
//! natural fit, and for anything built on top that wants to log or match on a cause.

use core::fmt::Debug;

/// Common trait implemented by every error type in this crate.
pub trait AllocatorError: Debug {}

/// `CanFail` is a return type for functions that are allowed to fail and don't need to return
/// anything on success.
pub type CanFail<T> = Result<(), T>;

/// Failure of the region provider to satisfy an `sbrk` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionError {
    /// The provider has no more backing memory to extend the region with.
    Exhausted,

    /// The requested extension would overflow the provider's address space.
    Overflow,
}

impl AllocatorError for RegionError {}

impl core::fmt::Display for RegionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Exhausted => f.write_str("region provider is exhausted"),
            Self::Overflow => f.write_str("region extension would overflow the address space"),
        }
    }
}

/// Failure of the heap itself, as distinct from its region provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// `init` could not obtain the initial sentinel region from the provider.
    InitFailed,

    /// An operation was attempted before the heap was initialized.
    NotInitialized,
}

impl AllocatorError for HeapError {}

impl core::fmt::Display for HeapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InitFailed => f.write_str("heap failed to initialize"),
            Self::NotInitialized => f.write_str("heap used before init"),
        }
    }
}
