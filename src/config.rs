//! Tunable constants for the heap allocator.
//!
//! Collected here so the allocator's design choices (class boundaries, the mini block size,
//! the extension chunk size, the better-fit scan bound) read as deliberate, reviewable values
//! rather than magic numbers scattered through the implementation.

/// Size in bytes of a header or footer word.
pub const WORD_SIZE: u64 = 8;

/// All block addresses and sizes are aligned to this boundary.
pub const BLOCK_ALIGN: u64 = 16;

/// The smallest block the allocator ever hands out: header (8B) + payload (8B), no footer.
pub const MINI_BLOCK_SIZE: u64 = 16;

/// Every non-mini block is at least this large: header (8B) + next/prev pointers (16B) + footer (8B).
pub const MIN_BLOCK_SIZE: u64 = 32;

/// Number of segregated size classes for non-mini free blocks.
pub const NUM_SEG_CLASSES: usize = 10;

/// Upper size bound (inclusive) for each segregated class, indexed 0..NUM_SEG_CLASSES.
///
/// A free block of size `s` belongs to the smallest index whose bound is `>= s`. Blocks of
/// size [`MINI_BLOCK_SIZE`] never land here; they live in the dedicated mini list.
pub const SEG_CLASS_BOUNDS: [u64; NUM_SEG_CLASSES] =
    [16, 32, 64, 128, 256, 512, 1024, 2048, 4096, u64::MAX];

/// Number of further blocks the fit finder scans past its first hit, looking for a tighter fit.
pub const BETTER_FIT_SCAN_LIMIT: usize = 20;

/// Bytes requested from the region provider the first time the heap is grown.
pub const INITIAL_CHUNK_SIZE: u64 = 1 << 12;

/// Bytes requested from the region provider to install the prologue/epilogue sentinels.
pub const INIT_REGION_SIZE: usize = 16;

/// Rounds `n` up to the next multiple of `align` (`align` must be a power of two).
#[inline]
#[must_use]
pub const fn round_up(n: u64, align: u64) -> u64 {
    (n + align - 1) & !(align - 1)
}
