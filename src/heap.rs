//! The allocator's public surface: [`Heap`] ties together the block layout, free-list index,
//! coalescer, fit finder and splitter into the classical allocate/free/reallocate/callocate API
//! over a single, monotonically growable region.

use crate::addr::BlockAddr;
use crate::block::{write_block, Block};
use crate::coalesce::coalesce;
use crate::config::{
    round_up, BLOCK_ALIGN, INITIAL_CHUNK_SIZE, INIT_REGION_SIZE, MINI_BLOCK_SIZE, MIN_BLOCK_SIZE,
    WORD_SIZE,
};
use crate::error::{HeapError, RegionError};
use crate::fit::find_fit;
use crate::freelist::{MiniList, SegList};
use crate::header::Header;
use crate::region::RegionProvider;
use crate::split::split;

/// A heap backed by a [`RegionProvider`], managed per the segregated-fit design described in
/// the crate's module docs.
///
/// `Heap` is intentionally `!Sync`-in-spirit: every method takes `&mut self` and there is no
/// internal locking, matching the crate's single-threaded concurrency model. A caller that
/// needs to share one heap across threads should reach for
/// [`crate::global::LockedHeap`] (behind the `global-allocator` feature) instead of adding
/// synchronization here.
pub struct Heap<R> {
    region: R,
    seg: SegList,
    mini: MiniList,
    epilogue: BlockAddr,
    initialized: bool,
}

impl<R: RegionProvider> Heap<R> {
    /// Builds an uninitialized heap over `region`. [`Self::init`] must be called before any
    /// other method.
    #[must_use]
    pub fn new(region: R) -> Self {
        Self {
            region,
            seg: SegList::new(),
            mini: MiniList::new(),
            epilogue: BlockAddr::NULL,
            initialized: false,
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Installs the prologue/epilogue sentinels and performs the heap's first extension.
    ///
    /// Resets all allocator state: any blocks live from a previous `init` become unreachable.
    /// Fails only if the region provider cannot even supply the initial 16 bytes.
    pub fn init(&mut self) -> Result<(), HeapError> {
        let base = self
            .region
            .sbrk(INIT_REGION_SIZE as u64)
            .map_err(|_| HeapError::InitFailed)?;

        let prologue = Header::pack(0, true, false, false);
        unsafe { Block::at(base).write_header(prologue) };

        let epilogue_addr = base + WORD_SIZE;
        let epilogue = Header::pack(0, true, true, false);
        unsafe { Block::at(epilogue_addr).write_header(epilogue) };

        self.seg = SegList::new();
        self.mini = MiniList::new();
        self.epilogue = epilogue_addr;
        self.initialized = true;

        log::debug!("heap initialized, base {base}");

        self.extend(INITIAL_CHUNK_SIZE)
            .map(|_| ())
            .map_err(|_| HeapError::InitFailed)
    }

    /// Grows the heap by at least `n` bytes (rounded up to 16), installing a fresh epilogue and
    /// coalescing the newly-born free block with whatever free block preceded the old epilogue.
    fn extend(&mut self, n: u64) -> Result<Block, RegionError> {
        let n = round_up(n, BLOCK_ALIGN);
        let old_epilogue = self.epilogue;
        let old_header = unsafe { Block::at(old_epilogue).header() };

        let new_region = self.region.sbrk(n)?;
        debug_assert_eq!(
            new_region,
            old_epilogue + WORD_SIZE,
            "region provider did not extend contiguously from the heap top"
        );

        let block = Block::at(old_epilogue);
        let header = Header::pack(n, false, old_header.prev_alloc(), old_header.prev_mini());
        unsafe { block.write_header(header) };
        if n >= MIN_BLOCK_SIZE {
            unsafe { block.write_footer(n, header) };
        }

        let new_epilogue = old_epilogue + n;
        let epilogue = Header::pack(0, true, false, n == MINI_BLOCK_SIZE);
        unsafe { Block::at(new_epilogue).write_header(epilogue) };
        self.epilogue = new_epilogue;

        log::trace!("heap extended by {n} bytes, new top at {new_epilogue}");

        Ok(unsafe { coalesce(&mut self.seg, &mut self.mini, block) })
    }

    /// Allocates `n` bytes, returning the payload address or [`BlockAddr::NULL`] if the region
    /// provider is exhausted, `n == 0`, or the heap was never [`Self::init`]ed.
    pub fn allocate(&mut self, n: u64) -> BlockAddr {
        if !self.initialized {
            log::warn!("{}", HeapError::NotInitialized);
            return BlockAddr::NULL;
        }

        if n == 0 {
            return BlockAddr::NULL;
        }

        let asize = adjusted_size(n);

        let addr = match unsafe { find_fit(&self.seg, &self.mini, asize) } {
            Some(addr) => addr,
            None => {
                let grow = core::cmp::max(asize, INITIAL_CHUNK_SIZE);
                if self.extend(grow).is_err() {
                    log::warn!("region provider exhausted allocating {n} bytes");
                    return BlockAddr::NULL;
                }
                match unsafe { find_fit(&self.seg, &self.mini, asize) } {
                    Some(addr) => addr,
                    None => return BlockAddr::NULL,
                }
            }
        };

        let block = Block::at(addr);
        let size = unsafe { block.size() };
        self.unlink(block, size);
        unsafe { write_block(block, size, true) };

        if let Some((remainder, remainder_size)) = unsafe { split(block, asize) } {
            self.link(remainder, remainder_size);
        }

        log::trace!(
            "allocated {n} bytes (asize {asize}) at {}",
            block.payload_addr()
        );
        block.payload_addr()
    }

    /// Frees the block owning payload `p`. A no-op on a null `p`.
    ///
    /// # Safety
    /// `p` must be null or a payload address returned by a still-live call to
    /// [`Self::allocate`], [`Self::reallocate`] or [`Self::callocate`] on this heap.
    pub unsafe fn free(&mut self, p: BlockAddr) {
        if p.is_null() {
            return;
        }
        if !self.initialized {
            log::warn!("{}", HeapError::NotInitialized);
            return;
        }

        let block = Block::from_payload(p);
        let size = block.size();
        debug_assert!(block.is_alloc(), "double free at {p}");

        write_block(block, size, false);
        coalesce(&mut self.seg, &mut self.mini, block);

        log::trace!("freed block at {p}");
    }

    /// `reallocate(null, n) == allocate(n)`; `reallocate(p, 0)` frees `p` and returns null;
    /// otherwise allocates `n` bytes, copies `min(old_payload, n)` bytes over, and frees `p`.
    /// On allocation failure, `p` is left untouched and null is returned.
    ///
    /// # Safety
    /// Same requirement on `p` as [`Self::free`].
    pub unsafe fn reallocate(&mut self, p: BlockAddr, n: u64) -> BlockAddr {
        if !self.initialized {
            log::warn!("{}", HeapError::NotInitialized);
            return BlockAddr::NULL;
        }
        if p.is_null() {
            return self.allocate(n);
        }
        if n == 0 {
            self.free(p);
            return BlockAddr::NULL;
        }

        let block = Block::from_payload(p);
        let old_payload_size = block.size() - WORD_SIZE;

        let new_p = self.allocate(n);
        if new_p.is_null() {
            return BlockAddr::NULL;
        }

        let copy_len = core::cmp::min(old_payload_size, n) as usize;
        core::ptr::copy_nonoverlapping(p.as_ptr::<u8>(), new_p.as_mut_ptr::<u8>(), copy_len);

        self.free(p);
        new_p
    }

    /// Allocates a zero-initialized region sized for `k` elements of `n` bytes each. Returns
    /// null on `k == 0` or if `k * n` overflows.
    pub fn callocate(&mut self, k: u64, n: u64) -> BlockAddr {
        if k == 0 {
            return BlockAddr::NULL;
        }

        let Some(total) = k.checked_mul(n) else {
            log::warn!("callocate({k}, {n}) overflowed");
            return BlockAddr::NULL;
        };

        let p = self.allocate(total);
        if !p.is_null() {
            unsafe { core::ptr::write_bytes(p.as_mut_ptr::<u8>(), 0, total as usize) };
        }
        p
    }

    fn unlink(&mut self, block: Block, size: u64) {
        unsafe {
            if size == MINI_BLOCK_SIZE {
                self.mini.remove(block);
            } else {
                self.seg.remove(block, size);
            }
        }
    }

    fn link(&mut self, block: Block, size: u64) {
        unsafe {
            if size == MINI_BLOCK_SIZE {
                self.mini.push_front(block);
            } else {
                self.seg.push(block, size);
            }
        }
    }

    /// Runs the full invariant check from [`crate::check`] over the current heap state.
    #[must_use]
    pub fn check(&self) -> bool {
        unsafe {
            crate::check::check_heap(
                self.region.heap_lo(),
                self.epilogue,
                self.region.heap_lo(),
                self.region.heap_hi(),
                &self.seg,
                &self.mini,
            )
        }
    }
}

/// `asize = round_up(n + 8, 16)`, floored at 16: the +8 accounts for the block header, and the
/// allocated layout carries no footer.
#[inline]
#[must_use]
fn adjusted_size(n: u64) -> u64 {
    core::cmp::max(round_up(n + WORD_SIZE, BLOCK_ALIGN), MINI_BLOCK_SIZE)
}

#[cfg(test)]
mod tests {
    use super::Heap;
    use crate::region::VecRegion;

    fn heap() -> Heap<VecRegion> {
        let mut heap = Heap::new(VecRegion::default());
        heap.init().expect("init failed");
        heap
    }

    #[test]
    fn allocate_returns_aligned_payload() {
        let mut heap = heap();
        let p = heap.allocate(24);
        assert!(!p.is_null());
        assert_eq!(p.as_usize() % 16, 0);
        assert!(heap.check());
        unsafe { heap.free(p) };
        assert!(heap.check());
    }

    #[test]
    fn split_remainder_header_is_not_built_from_stale_payload_bytes() {
        // Fill a block's payload with non-zero bytes, free it, then allocate a smaller amount
        // from the same region. The split carves a remainder whose header lands on bytes that
        // used to be payload (now 0xFF, not freshly-zeroed `Vec` storage); its prev_alloc/
        // prev_mini must come out correct regardless.
        let mut heap = heap();
        let p = heap.allocate(200);
        assert!(!p.is_null());
        unsafe { core::ptr::write_bytes(p.as_mut_ptr::<u8>(), 0xFF, 200) };
        unsafe { heap.free(p) };
        assert!(heap.check());

        let q = heap.allocate(32);
        assert!(!q.is_null());
        assert!(heap.check());
        unsafe { heap.free(q) };
        assert!(heap.check());
    }

    #[test]
    fn allocate_before_init_returns_null() {
        let mut heap = Heap::new(VecRegion::default());
        assert!(heap.allocate(16).is_null());
    }

    #[test]
    fn small_request_allocates_a_mini_block() {
        let mut heap = heap();
        let p = heap.allocate(8);
        assert!(!p.is_null());
        let block = crate::block::Block::from_payload(p);
        assert_eq!(unsafe { block.size() }, 16);
        unsafe { heap.free(p) };
        assert!(heap.check());
    }

    #[test]
    fn adjacent_frees_coalesce_into_one_block() {
        let mut heap = heap();
        let p1 = heap.allocate(24);
        let p2 = heap.allocate(24);
        unsafe {
            heap.free(p1);
            heap.free(p2);
        }
        assert!(heap.check());
    }

    #[test]
    fn allocate_zero_returns_null() {
        let mut heap = heap();
        assert!(heap.allocate(0).is_null());
    }

    #[test]
    fn callocate_zeroes_memory_and_rejects_overflow() {
        let mut heap = heap();
        assert!(heap.callocate(0, 100).is_null());
        assert!(heap.callocate(1 << 40, 1 << 40).is_null());

        let p = heap.callocate(10, 8);
        assert!(!p.is_null());
        let bytes = unsafe { core::slice::from_raw_parts(p.as_ptr::<u8>(), 80) };
        assert!(bytes.iter().all(|&b| b == 0));
        unsafe { heap.free(p) };
    }

    #[test]
    fn reallocate_preserves_leading_bytes() {
        let mut heap = heap();
        let p = heap.allocate(100);
        unsafe { core::ptr::write_bytes(p.as_mut_ptr::<u8>(), 0xAB, 100) };

        let q = unsafe { heap.reallocate(p, 200) };
        assert!(!q.is_null());
        let bytes = unsafe { core::slice::from_raw_parts(q.as_ptr::<u8>(), 100) };
        assert!(bytes.iter().all(|&b| b == 0xAB));
        unsafe { heap.free(q) };
    }

    #[test]
    fn reallocate_null_behaves_like_allocate() {
        let mut heap = heap();
        let p = unsafe { heap.reallocate(crate::addr::BlockAddr::NULL, 32) };
        assert!(!p.is_null());
        unsafe { heap.free(p) };
    }

    #[test]
    fn reallocate_to_zero_frees_and_returns_null() {
        let mut heap = heap();
        let p = heap.allocate(32);
        let q = unsafe { heap.reallocate(p, 0) };
        assert!(q.is_null());
        assert!(heap.check());
    }

    #[test]
    fn fill_release_pattern_ends_with_a_single_free_block() {
        let mut heap = heap();
        let mut ptrs = alloc_many(&mut heap);

        for (i, &p) in ptrs.iter().enumerate() {
            if i % 2 == 0 {
                unsafe { heap.free(p) };
            }
        }
        assert!(heap.check());
        for (i, &p) in ptrs.iter().enumerate() {
            if i % 2 == 1 {
                unsafe { heap.free(p) };
            }
        }
        assert!(heap.check());
        ptrs.clear();
    }

    fn alloc_many(heap: &mut Heap<VecRegion>) -> std::vec::Vec<crate::addr::BlockAddr> {
        (0..1000u64)
            .map(|i| heap.allocate(16 + (i % 128) * 16))
            .collect()
    }
}
