//! The implicit list walker and the write-block contract.
//!
//! A [`Block`] is a lightweight handle to a block's address; it carries no borrow of the heap
//! memory itself; reading or writing through it is `unsafe` because the caller must guarantee
//! the address currently denotes a live block inside the managed region.

use crate::addr::BlockAddr;
use crate::config::{BLOCK_ALIGN, MINI_BLOCK_SIZE, WORD_SIZE};
use crate::header::Header;

const NEXT_FREE_OFFSET: u64 = WORD_SIZE;
const PREV_FREE_OFFSET: u64 = 2 * WORD_SIZE;

/// A handle to a block's header address.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Block {
    addr: BlockAddr,
}

impl Block {
    #[must_use]
    pub const fn at(addr: BlockAddr) -> Self {
        Self { addr }
    }

    #[must_use]
    pub const fn addr(self) -> BlockAddr {
        self.addr
    }

    /// # Safety
    ///
    /// `self.addr()` must point at a live header inside the managed region.
    #[must_use]
    pub unsafe fn header(self) -> Header {
        Header::from_raw(core::ptr::read(self.addr.as_ptr::<u64>()))
    }

    /// # Safety
    ///
    /// `self.addr()` must point at writable memory inside the managed region.
    pub unsafe fn write_header(self, header: Header) {
        core::ptr::write(self.addr.as_mut_ptr::<u64>(), header.as_raw());
    }

    /// # Safety
    ///
    /// Same requirement as [`Self::header`].
    #[must_use]
    pub unsafe fn size(self) -> u64 {
        self.header().size()
    }

    /// # Safety
    ///
    /// Same requirement as [`Self::header`].
    #[must_use]
    pub unsafe fn is_alloc(self) -> bool {
        self.header().is_alloc()
    }

    /// # Safety
    ///
    /// Same requirement as [`Self::header`].
    #[must_use]
    pub unsafe fn is_mini(self) -> bool {
        self.size() == MINI_BLOCK_SIZE
    }

    /// Address of the footer word, valid only for free, non-mini blocks of the given size.
    #[must_use]
    pub fn footer_addr(self, size: u64) -> BlockAddr {
        self.addr + (size - WORD_SIZE)
    }

    /// # Safety
    ///
    /// Must only be called on a free, non-mini block; `size` must be its current size.
    #[must_use]
    pub unsafe fn footer(self, size: u64) -> Header {
        Header::from_raw(core::ptr::read(self.footer_addr(size).as_ptr::<u64>()))
    }

    /// # Safety
    ///
    /// Must only be called on a free, non-mini block; `size` must be its current size.
    pub unsafe fn write_footer(self, size: u64, header: Header) {
        core::ptr::write(self.footer_addr(size).as_mut_ptr::<u64>(), header.as_raw());
    }

    /// Returns the block immediately following `self` in address order.
    ///
    /// # Safety
    ///
    /// Must not be called on the epilogue; `self` must currently be a live block of the size
    /// its header reports.
    #[must_use]
    pub unsafe fn next(self) -> Block {
        Block::at(self.addr + self.size())
    }

    /// Returns the block immediately preceding `self` in address order.
    ///
    /// Valid only when `!header.prev_alloc()`. When `header.prev_mini()` the previous block is
    /// located purely by arithmetic (`addr - 16`); otherwise its size is read from the footer
    /// word directly preceding `self`.
    ///
    /// # Safety
    ///
    /// The caller must have already checked `!self.header().prev_alloc()`; `self` must not be
    /// the prologue.
    #[must_use]
    pub unsafe fn prev(self, prev_mini: bool) -> Block {
        if prev_mini {
            Block::at(self.addr - MINI_BLOCK_SIZE)
        } else {
            let footer = Header::from_raw(core::ptr::read(
                (self.addr - WORD_SIZE).as_ptr::<u64>(),
            ));
            Block::at(self.addr - footer.size())
        }
    }

    /// Address of the first payload byte, for an allocated block.
    #[must_use]
    pub fn payload_addr(self) -> BlockAddr {
        self.addr + WORD_SIZE
    }

    /// Recovers the owning block from a payload address previously returned by `allocate`.
    #[must_use]
    pub fn from_payload(payload: BlockAddr) -> Self {
        Block::at(payload - WORD_SIZE)
    }

    /// Reads the "next free" link, valid for blocks currently in the mini list or a segregated
    /// list. A null address means "no next".
    ///
    /// # Safety
    ///
    /// `self` must currently be a free block with a live next/prev pointer region.
    #[must_use]
    pub unsafe fn next_free(self) -> BlockAddr {
        BlockAddr::new(core::ptr::read(
            (self.addr + NEXT_FREE_OFFSET).as_ptr::<usize>(),
        ))
    }

    /// # Safety
    ///
    /// Same requirement as [`Self::next_free`].
    pub unsafe fn set_next_free(self, next: BlockAddr) {
        core::ptr::write(
            (self.addr + NEXT_FREE_OFFSET).as_mut_ptr::<usize>(),
            next.as_usize(),
        );
    }

    /// Reads the "prev free" link. Only meaningful for non-mini free blocks (segregated lists
    /// are doubly linked; the mini list is not).
    ///
    /// # Safety
    ///
    /// `self` must currently be a free, non-mini block.
    #[must_use]
    pub unsafe fn prev_free(self) -> BlockAddr {
        BlockAddr::new(core::ptr::read(
            (self.addr + PREV_FREE_OFFSET).as_ptr::<usize>(),
        ))
    }

    /// # Safety
    ///
    /// Same requirement as [`Self::prev_free`].
    pub unsafe fn set_prev_free(self, prev: BlockAddr) {
        core::ptr::write(
            (self.addr + PREV_FREE_OFFSET).as_mut_ptr::<usize>(),
            prev.as_usize(),
        );
    }
}

/// Writes block `b` as having size `s` and allocation status `a`, per the write-block contract:
///
/// 1. write `b`'s header with `(s, a, prev_alloc, prev_mini)`, where the latter two are
///    preserved from `b`'s current header;
/// 2. if `!a` and `s >= 32`, write a footer identical to the header;
/// 3. update `next(b)`'s header so its `prev_alloc` bit equals `a` and its `prev_mini` bit
///    equals `s == 16`; if that neighbor is itself free and non-mini, its footer is updated too.
///
/// # Safety
///
/// `b` must currently be a live block whose header reports at least `s` bytes available before
/// the following block, i.e. `next` (computed from `s`) must be a live block or the epilogue.
pub unsafe fn write_block(b: Block, s: u64, a: bool) {
    let prev_alloc = b.header().prev_alloc();
    let prev_mini = b.header().prev_mini();
    let header = Header::pack(s, a, prev_alloc, prev_mini);

    b.write_header(header);
    if !a && s >= crate::config::MIN_BLOCK_SIZE {
        b.write_footer(s, header);
    }

    let next = Block::at(b.addr() + s);
    let next_header = next
        .header()
        .with_prev_alloc(a)
        .with_prev_mini(s == MINI_BLOCK_SIZE);
    next.write_header(next_header);

    if !next_header.is_alloc() && next_header.size() >= crate::config::MIN_BLOCK_SIZE {
        next.write_footer(next_header.size(), next_header);
    }
}

#[inline]
#[must_use]
pub const fn is_block_aligned(size: u64) -> bool {
    size % BLOCK_ALIGN == 0
}
