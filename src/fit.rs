//! Fit selection: pick a free block to satisfy an allocation request.
//!
//! `find_fit` first checks the mini list for a 16-byte request (the head is always returned,
//! without a size comparison, since every mini block is exactly 16 bytes by construction).
//! Otherwise it walks the segregated classes from `index_for(asize)` upward until it finds a
//! block of sufficient size (the anchor), then scans up to [`BETTER_FIT_SCAN_LIMIT`] further
//! blocks in that same class looking for a tighter fit.

use crate::addr::BlockAddr;
use crate::block::Block;
use crate::config::{BETTER_FIT_SCAN_LIMIT, MINI_BLOCK_SIZE, NUM_SEG_CLASSES};
use crate::freelist::{MiniList, SegList};

/// Finds a free block able to satisfy a request of `asize` bytes.
///
/// # Safety
///
/// Every block reachable from `mini` and `seg`'s lists must be live.
#[must_use]
pub unsafe fn find_fit(seg: &SegList, mini: &MiniList, asize: u64) -> Option<BlockAddr> {
    if asize == MINI_BLOCK_SIZE {
        if let Some(head) = mini.head() {
            return Some(head);
        }
    }

    let start = SegList::index_for(asize);
    for index in start..NUM_SEG_CLASSES {
        let Some(head) = seg.head(index) else {
            continue;
        };

        if let Some(anchor) = find_anchor(head, asize) {
            return Some(better_fit_scan(anchor, asize));
        }
    }

    None
}

/// Walks a class list in link order until a block of size `>= asize` is found.
unsafe fn find_anchor(head: BlockAddr, asize: u64) -> Option<BlockAddr> {
    let mut cursor = head;
    while !cursor.is_null() {
        if Block::at(cursor).size() >= asize {
            return Some(cursor);
        }
        cursor = Block::at(cursor).next_free();
    }
    None
}

/// From `anchor` (inclusive, counted as iteration 0), scans up to `BETTER_FIT_SCAN_LIMIT`
/// further blocks in the same list, returning the smallest block seen with size `>= asize`
/// (ties broken by first-seen).
unsafe fn better_fit_scan(anchor: BlockAddr, asize: u64) -> BlockAddr {
    let mut best = anchor;
    let mut best_size = Block::at(anchor).size();

    let mut cursor = anchor;
    let mut counter = 0;
    loop {
        let size = Block::at(cursor).size();
        if size >= asize && size < best_size {
            best = cursor;
            best_size = size;
        }

        if counter == BETTER_FIT_SCAN_LIMIT {
            return best;
        }
        counter += 1;

        let next = Block::at(cursor).next_free();
        if next.is_null() {
            return best;
        }
        cursor = next;
    }
}
