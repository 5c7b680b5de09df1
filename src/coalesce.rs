//! Merging a newly-freed block with its immediate address-order neighbors.

use crate::block::{write_block, Block};
use crate::config::MINI_BLOCK_SIZE;
use crate::freelist::{MiniList, SegList};

/// Coalesces `block` (already marked free, not yet linked into any free list) with whichever
/// of its immediate neighbors are themselves free, then links the resulting block into the
/// appropriate free pool.
///
/// Returns the surviving block, which may be `block` itself or its predecessor.
///
/// # Safety
/// `block` must be a live, free block not currently present in `seg` or `mini`; every block
/// reachable from `seg`/`mini` must be live.
pub unsafe fn coalesce(seg: &mut SegList, mini: &mut MiniList, block: Block) -> Block {
    let header = block.header();
    let prev_free = !header.prev_alloc();
    let next = block.next();
    let next_free = !next.is_alloc();

    if !prev_free && !next_free {
        // Neither neighbor is free: `block` is already written free by the caller, nothing to
        // merge. Just link it into its pool.
        link(seg, mini, block, header.size());
        return block;
    }

    let (target, size) = match (prev_free, next_free) {
        (false, false) => unreachable!(),
        (false, true) => {
            let next_size = next.size();
            unlink(seg, mini, next, next_size);
            (block, header.size() + next_size)
        }
        (true, false) => {
            let prev = block.prev(header.prev_mini());
            let prev_size = prev.size();
            unlink(seg, mini, prev, prev_size);
            (prev, prev_size + header.size())
        }
        (true, true) => {
            let prev = block.prev(header.prev_mini());
            let prev_size = prev.size();
            let next_size = next.size();
            unlink(seg, mini, prev, prev_size);
            unlink(seg, mini, next, next_size);
            (prev, prev_size + header.size() + next_size)
        }
    };

    write_block(target, size, false);
    link(seg, mini, target, size);
    target
}

unsafe fn unlink(seg: &mut SegList, mini: &mut MiniList, block: Block, size: u64) {
    if size == MINI_BLOCK_SIZE {
        mini.remove(block);
    } else {
        seg.remove(block, size);
    }
}

unsafe fn link(seg: &mut SegList, mini: &mut MiniList, block: Block, size: u64) {
    if size == MINI_BLOCK_SIZE {
        mini.push_front(block);
    } else {
        seg.push(block, size);
    }
}
