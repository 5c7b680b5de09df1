//! The segregated free lists: 10 doubly-linked LIFO lists of non-mini free blocks, indexed by
//! size class.

use crate::addr::BlockAddr;
use crate::block::Block;
use crate::config::{MINI_BLOCK_SIZE, NUM_SEG_CLASSES, SEG_CLASS_BOUNDS};

/// Heads of the 10 segregated free lists.
#[derive(Clone, Copy, Debug)]
pub struct SegList {
    heads: [BlockAddr; NUM_SEG_CLASSES],
}

impl SegList {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heads: [BlockAddr::NULL; NUM_SEG_CLASSES],
        }
    }

    /// Returns the class index a block of the given size maps to.
    ///
    /// Blocks of [`MINI_BLOCK_SIZE`] never actually get linked into a segregated class (they
    /// live in the mini list), but the fit finder still needs to compute this index for a mini
    /// request to start its upward class scan from the right place, so this is not restricted
    /// to non-mini sizes. [`Self::push`] and [`Self::remove`] are the calls that must never see
    /// a mini block.
    #[must_use]
    pub fn index_for(size: u64) -> usize {
        SEG_CLASS_BOUNDS
            .iter()
            .position(|&bound| size <= bound)
            .unwrap_or(NUM_SEG_CLASSES - 1)
    }

    #[must_use]
    pub fn head(self, index: usize) -> Option<BlockAddr> {
        (!self.heads[index].is_null()).then_some(self.heads[index])
    }

    /// Prepends `block` (of `size`) to its class list. O(1).
    ///
    /// # Safety
    ///
    /// `block` must be a live, free, non-mini block not already linked into any free list.
    pub unsafe fn push(&mut self, block: Block, size: u64) {
        debug_assert!(size > MINI_BLOCK_SIZE, "mini blocks do not use SegList");
        let index = Self::index_for(size);
        let old_head = self.heads[index];

        block.set_prev_free(BlockAddr::NULL);
        block.set_next_free(old_head);
        if !old_head.is_null() {
            Block::at(old_head).set_prev_free(block.addr());
        }
        self.heads[index] = block.addr();
    }

    /// Splices `block` (of `size`) out of its class list. O(1).
    ///
    /// # Safety
    ///
    /// `block` must currently be linked into the class list `size` maps to.
    pub unsafe fn remove(&mut self, block: Block, size: u64) {
        debug_assert!(size > MINI_BLOCK_SIZE, "mini blocks do not use SegList");
        let index = Self::index_for(size);
        let prev = block.prev_free();
        let next = block.next_free();

        if prev.is_null() {
            self.heads[index] = next;
        } else {
            Block::at(prev).set_next_free(next);
        }

        if !next.is_null() {
            Block::at(next).set_prev_free(prev);
        }
    }

    /// Counts the entries across every class. Intended for the debug invariant checker.
    ///
    /// # Safety
    ///
    /// Every link reachable from every head must point at a live block.
    #[must_use]
    pub unsafe fn len(self) -> usize {
        let mut count = 0;
        for index in 0..NUM_SEG_CLASSES {
            let mut cursor = self.heads[index];
            while !cursor.is_null() {
                count += 1;
                cursor = Block::at(cursor).next_free();
            }
        }
        count
    }
}

impl Default for SegList {
    fn default() -> Self {
        Self::new()
    }
}
