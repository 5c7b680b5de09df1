//! Debug invariant checker: validates every invariant from the data model in one linear pass
//! over the implicit list, then over both free-list indexes.
//!
//! Intended to be invocable before and after every public heap operation during tests (see
//! [`crate::test_support::CheckedHeap`]); it deliberately returns `false` and logs instead of
//! panicking, so a caller can assert on the result without losing the first violation to a
//! cascade of follow-on panics.

use crate::addr::BlockAddr;
use crate::block::Block;
use crate::config::{BLOCK_ALIGN, MINI_BLOCK_SIZE, MIN_BLOCK_SIZE, NUM_SEG_CLASSES, WORD_SIZE};
use crate::freelist::{MiniList, SegList};

/// Validates the heap's invariants.
///
/// # Safety
/// Every block between `prologue` and `epilogue`, and every block reachable from `seg`/`mini`,
/// must be live and inside `[heap_lo, heap_hi]`.
pub unsafe fn check_heap(
    prologue: BlockAddr,
    epilogue: BlockAddr,
    heap_lo: BlockAddr,
    heap_hi: BlockAddr,
    seg: &SegList,
    mini: &MiniList,
) -> bool {
    let Some(implicit_free) = walk_implicit_list(prologue, epilogue) else {
        return false;
    };

    if !check_mini_list(mini, heap_lo, heap_hi) {
        return false;
    }
    if !check_seg_lists(seg, heap_lo, heap_hi) {
        return false;
    }

    let list_free = seg.len() + mini.len();
    if list_free != implicit_free {
        log::warn!(
            "list-heap parity violated: {implicit_free} free blocks in the implicit list, \
             {list_free} entries across the free lists"
        );
        return false;
    }

    true
}

/// Walks the implicit list from just after `prologue` to `epilogue`, checking alignment,
/// footer fidelity, the prev-alloc/prev-mini bits and coalescing completeness. Returns the
/// number of free blocks seen, or `None` on the first violation.
unsafe fn walk_implicit_list(prologue: BlockAddr, epilogue: BlockAddr) -> Option<usize> {
    let mut free_count = 0usize;
    // The prologue is a bare sentinel word (size 0); the first real block sits right after it,
    // not at `prologue.next()` (which would compute `prologue + 0`).
    let mut cursor = Block::at(prologue + WORD_SIZE);
    let mut prev_alloc = true;
    let mut prev_mini = false;

    while cursor.addr() != epilogue {
        let header = cursor.header();

        if header.size() < MINI_BLOCK_SIZE || header.size() % BLOCK_ALIGN != 0 {
            log::warn!(
                "block at {} has invalid size {}",
                cursor.addr(),
                header.size()
            );
            return None;
        }
        if !cursor.payload_addr().is_aligned(BLOCK_ALIGN) {
            log::warn!(
                "payload at {} is not {}-byte aligned",
                cursor.payload_addr(),
                BLOCK_ALIGN
            );
            return None;
        }
        if header.prev_alloc() != prev_alloc || header.prev_mini() != prev_mini {
            log::warn!(
                "block at {} carries stale prev-alloc/prev-mini bits",
                cursor.addr()
            );
            return None;
        }

        if !header.is_alloc() {
            free_count += 1;
            if !prev_alloc {
                log::warn!("adjacent free blocks ending at {}", cursor.addr());
                return None;
            }
            if header.size() >= MIN_BLOCK_SIZE {
                let footer = cursor.footer(header.size());
                if footer.as_raw() != header.as_raw() {
                    log::warn!("footer mismatch for free block at {}", cursor.addr());
                    return None;
                }
            }
        }

        prev_alloc = header.is_alloc();
        prev_mini = header.size() == MINI_BLOCK_SIZE;
        cursor = cursor.next();
    }

    Some(free_count)
}

unsafe fn check_mini_list(mini: &MiniList, heap_lo: BlockAddr, heap_hi: BlockAddr) -> bool {
    let Some(head) = mini.head() else {
        return true;
    };

    let mut cursor = head;
    loop {
        if cursor < heap_lo || cursor > heap_hi {
            log::warn!("mini list entry {cursor} outside heap bounds");
            return false;
        }

        let block = Block::at(cursor);
        if block.is_alloc() {
            log::warn!("allocated block {cursor} found in the mini list");
            return false;
        }
        if block.size() != MINI_BLOCK_SIZE {
            log::warn!("non-mini block {cursor} found in the mini list");
            return false;
        }

        let next = block.next_free();
        if next == cursor {
            log::warn!("self-loop at mini list entry {cursor}");
            return false;
        }
        if next.is_null() {
            break;
        }
        cursor = next;
    }

    true
}

unsafe fn check_seg_lists(seg: &SegList, heap_lo: BlockAddr, heap_hi: BlockAddr) -> bool {
    for index in 0..NUM_SEG_CLASSES {
        let Some(head) = seg.head(index) else {
            continue;
        };

        let mut cursor = head;
        let mut prev = BlockAddr::NULL;
        loop {
            if cursor < heap_lo || cursor > heap_hi {
                log::warn!("segregated list entry {cursor} (class {index}) outside heap bounds");
                return false;
            }

            let block = Block::at(cursor);
            if block.is_alloc() {
                log::warn!("allocated block {cursor} found in segregated class {index}");
                return false;
            }
            if SegList::index_for(block.size()) != index {
                log::warn!(
                    "block {cursor} of size {} misfiled in class {index}",
                    block.size()
                );
                return false;
            }
            if block.prev_free() != prev {
                log::warn!("broken back-link at segregated list entry {cursor}");
                return false;
            }

            let next = block.next_free();
            if next == cursor {
                log::warn!("self-loop at segregated list entry {cursor}");
                return false;
            }
            if !next.is_null() && Block::at(next).prev_free() != cursor {
                log::warn!("A.next.prev != A at segregated list entry {cursor}");
                return false;
            }

            if next.is_null() {
                break;
            }
            prev = cursor;
            cursor = next;
        }
    }

    true
}
