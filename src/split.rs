//! Splitting a just-allocated block's trailing remainder back into the free pools.

use crate::block::Block;
use crate::config::{MINI_BLOCK_SIZE, MIN_BLOCK_SIZE};
use crate::header::Header;

/// Splits `block` (already marked allocated, with header size `size(block)`) down to `asize`
/// bytes, if the remainder would be at least 16 bytes.
///
/// Returns the free remainder block and its size when a split happened, so the caller can push
/// it into the appropriate free pool; returns `None` when the block was left untouched because
/// no worthwhile remainder exists.
///
/// The remainder's header is built from scratch rather than routed through
/// [`crate::block::write_block`]: that helper preserves `prev_alloc`/`prev_mini` by reading
/// them off the block being written, which is only sound for a block that already carries a
/// live header. The remainder is freshly carved out of the middle of `block`'s former payload,
/// so those bytes are stale; its `prev_alloc`/`prev_mini` must instead be set explicitly from
/// `block`'s known post-split state (`prev_alloc = true` since `block` itself is allocated,
/// `prev_mini = (asize == 16)`), the same way [`crate::heap::Heap::extend`] builds a
/// freshly-carved block's header from scratch rather than preserving anything from it.
///
/// # Safety
///
/// `block` must be a live, allocated block whose header already reports its pre-split size;
/// the block that will become `next(block)` after the resize must be a live block or the
/// epilogue.
pub unsafe fn split(block: Block, asize: u64) -> Option<(Block, u64)> {
    let current_size = block.size();
    let remainder_size = current_size - asize;

    if !can_split(current_size, asize) {
        return None;
    }

    let header = block.header();
    block.write_header(Header::pack(
        asize,
        true,
        header.prev_alloc(),
        header.prev_mini(),
    ));

    let remainder = Block::at(block.addr() + asize);
    let remainder_header = Header::pack(remainder_size, false, true, asize == MINI_BLOCK_SIZE);
    remainder.write_header(remainder_header);
    if remainder_size >= MIN_BLOCK_SIZE {
        remainder.write_footer(remainder_size, remainder_header);
    }

    let next = Block::at(remainder.addr() + remainder_size);
    let next_header = next
        .header()
        .with_prev_alloc(false)
        .with_prev_mini(remainder_size == MINI_BLOCK_SIZE);
    next.write_header(next_header);
    if !next_header.is_alloc() && next_header.size() >= MIN_BLOCK_SIZE {
        next.write_footer(next_header.size(), next_header);
    }

    Some((remainder, remainder_size))
}

/// Whether splitting a block of `current_size` down to `asize` leaves a usable remainder.
/// Both sizes are always multiples of 16, so the only way the difference fails to be a valid
/// block size is for it to be zero.
#[inline]
#[must_use]
pub const fn can_split(current_size: u64, asize: u64) -> bool {
    current_size - asize >= MIN_BLOCK_SIZE || current_size - asize == MINI_BLOCK_SIZE
}
