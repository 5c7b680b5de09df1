//! Synchronized `GlobalAlloc` adapter over [`Heap`], gated behind the `global-allocator`
//! feature.
//!
//! The CORE heap stays single-threaded and lock-free, matching the crate's concurrency model.
//! This wrapper is what a caller reaches for when it needs to install the heap as
//! `#[global_allocator]`: a `static LockedHeap` declared with [`LockedHeap::uninit`] (the same
//! `OnceCell::uninit()` + lazy `init_once` shape this crate's sibling kernel uses for every one
//! of its own global singletons), populated once a real region is available, and guarded by a
//! [`spin::Mutex`] for the lifetime of the program after that.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr;

use conquer_once::spin::OnceCell;
use spin::Mutex;

use crate::addr::BlockAddr;
use crate::config::BLOCK_ALIGN;
use crate::error::HeapError;
use crate::heap::Heap;
use crate::region::RegionProvider;

/// A [`Heap`] behind a spinlock, lazily installed behind a [`OnceCell`] so it can live in a
/// `static` before the region it manages is available, and exposed as [`GlobalAlloc`].
///
/// Calling `alloc`/`dealloc` before [`Self::init`] has run panics (via the `OnceCell` being
/// empty), same as using [`Heap`] directly before [`Heap::init`] is undefined behavior.
///
/// The allocator only guarantees 16-byte-aligned payloads (see the block layout); a `Layout`
/// requesting stricter alignment is rejected with a null pointer rather than silently
/// under-aligning the allocation.
pub struct LockedHeap<R> {
    inner: OnceCell<Mutex<Heap<R>>>,
}

impl<R: RegionProvider> LockedHeap<R> {
    /// Builds an empty, `const`-initializable adapter suitable for a `static`.
    #[must_use]
    pub const fn uninit() -> Self {
        Self {
            inner: OnceCell::uninit(),
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    /// Builds the heap over `region` and installs its sentinels. Idempotent: only the first
    /// call does any work, matching `OnceCell::init_once`'s contract.
    pub fn init(&self, region: R) -> Result<(), HeapError> {
        let mut heap = Heap::new(region);
        heap.init()?;
        self.inner.init_once(|| Mutex::new(heap));
        Ok(())
    }

    fn heap(&self) -> &Mutex<Heap<R>> {
        self.inner
            .get()
            .expect("LockedHeap used before LockedHeap::init")
    }
}

unsafe impl<R: RegionProvider> GlobalAlloc for LockedHeap<R> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() as u64 > BLOCK_ALIGN {
            return ptr::null_mut();
        }
        self.heap().lock().allocate(layout.size() as u64).as_mut_ptr()
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.heap().lock().free(BlockAddr::from_ptr(ptr));
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.align() as u64 > BLOCK_ALIGN {
            return ptr::null_mut();
        }
        self.heap()
            .lock()
            .callocate(1, layout.size() as u64)
            .as_mut_ptr()
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() as u64 > BLOCK_ALIGN {
            return ptr::null_mut();
        }
        self.heap()
            .lock()
            .reallocate(BlockAddr::from_ptr(ptr), new_size as u64)
            .as_mut_ptr()
    }
}
