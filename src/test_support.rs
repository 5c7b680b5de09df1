//! Test-only harness: wraps [`Heap`] with invariant-checker calls before and after every public
//! operation, as the checker's own intent (§4.10-style validation around each public call)
//! prescribes.

use crate::addr::BlockAddr;
use crate::error::HeapError;
use crate::heap::Heap;
use crate::region::RegionProvider;

/// A [`Heap`] that runs [`Heap::check`] before and after every call, panicking with a
/// descriptive message the first time an invariant is violated.
pub struct CheckedHeap<R> {
    heap: Heap<R>,
}

impl<R: RegionProvider> CheckedHeap<R> {
    /// Builds and initializes a heap over `region`, asserting the invariants hold immediately
    /// after `init`.
    ///
    /// # Panics
    /// Panics if `init` fails or the checker finds a violation.
    #[must_use]
    pub fn init(region: R) -> Self {
        let mut heap = Heap::new(region);
        heap.init().expect("heap init failed");
        assert!(heap.check(), "invariants violated right after init");
        Self { heap }
    }

    /// Same as [`Heap::init`], but surfaces the failure instead of panicking.
    pub fn try_init(region: R) -> Result<Self, HeapError> {
        let mut heap = Heap::new(region);
        heap.init()?;
        Ok(Self { heap })
    }

    pub fn allocate(&mut self, n: u64) -> BlockAddr {
        assert!(self.heap.check(), "invariants violated before allocate({n})");
        let p = self.heap.allocate(n);
        assert!(self.heap.check(), "invariants violated after allocate({n})");
        p
    }

    /// # Safety
    /// Same requirement on `p` as [`Heap::free`].
    pub unsafe fn free(&mut self, p: BlockAddr) {
        assert!(self.heap.check(), "invariants violated before free({p})");
        self.heap.free(p);
        assert!(self.heap.check(), "invariants violated after free({p})");
    }

    /// # Safety
    /// Same requirement on `p` as [`Heap::reallocate`].
    pub unsafe fn reallocate(&mut self, p: BlockAddr, n: u64) -> BlockAddr {
        assert!(
            self.heap.check(),
            "invariants violated before reallocate({p}, {n})"
        );
        let q = self.heap.reallocate(p, n);
        assert!(
            self.heap.check(),
            "invariants violated after reallocate({p}, {n})"
        );
        q
    }

    pub fn callocate(&mut self, k: u64, n: u64) -> BlockAddr {
        assert!(
            self.heap.check(),
            "invariants violated before callocate({k}, {n})"
        );
        let p = self.heap.callocate(k, n);
        assert!(
            self.heap.check(),
            "invariants violated after callocate({k}, {n})"
        );
        p
    }

    #[must_use]
    pub fn inner(&self) -> &Heap<R> {
        &self.heap
    }
}
