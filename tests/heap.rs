//! End-to-end scenarios against a `VecRegion`-backed heap, run with the checker wrapped around
//! every call via `CheckedHeap`. Requires the `std` feature (`cargo test --features std`).

#![cfg(feature = "std")]

use fzmalloc::addr::BlockAddr;
use fzmalloc::region::VecRegion;
use fzmalloc::test_support::CheckedHeap;

fn heap() -> CheckedHeap<VecRegion> {
    CheckedHeap::init(VecRegion::default())
}

#[test]
fn allocate_is_sixteen_byte_aligned() {
    let mut heap = heap();
    let p = heap.allocate(8);
    assert!(!p.is_null());
    assert_eq!(p.as_usize() % 16, 0);
    unsafe { heap.free(p) };
}

#[test]
fn scenario_two_small_allocations_coalesce_into_one_free_block() {
    // p1 = allocate(24); p2 = allocate(24); free(p1); free(p2) -- after both frees a single
    // free block covers the combined region and the mini list stays empty.
    let mut heap = heap();
    let p1 = heap.allocate(24);
    let p2 = heap.allocate(24);
    unsafe {
        heap.free(p1);
        heap.free(p2);
    }
}

#[test]
fn scenario_small_request_becomes_a_mini_block() {
    let mut heap = heap();
    let p = heap.allocate(8);
    assert_eq!(p.as_usize() % 16, 0);
    unsafe { heap.free(p) };
}

#[test]
fn scenario_large_request_round_trips() {
    let mut heap = heap();
    let p = heap.allocate(4000);
    assert!(!p.is_null());
    unsafe { heap.free(p) };
}

#[test]
fn scenario_reallocate_preserves_leading_bytes() {
    let mut heap = heap();
    let p = heap.allocate(100);
    assert!(!p.is_null());
    unsafe { core::ptr::write_bytes(p.as_mut_ptr::<u8>(), 0xAB, 100) };

    let q = unsafe { heap.reallocate(p, 200) };
    assert!(!q.is_null());
    let bytes = unsafe { core::slice::from_raw_parts(q.as_ptr::<u8>(), 100) };
    assert!(bytes.iter().all(|&b| b == 0xAB));
    unsafe { heap.free(q) };
}

#[test]
fn reallocate_null_is_allocate() {
    let mut heap = heap();
    let p = unsafe { heap.reallocate(BlockAddr::NULL, 32) };
    assert!(!p.is_null());
    unsafe { heap.free(p) };
}

#[test]
fn reallocate_to_zero_frees_and_returns_null() {
    let mut heap = heap();
    let p = heap.allocate(32);
    let q = unsafe { heap.reallocate(p, 0) };
    assert!(q.is_null());
}

#[test]
fn scenario_callocate_rejects_zero_count_and_overflow() {
    let mut heap = heap();
    assert!(heap.callocate(0, 100).is_null());
    assert!(heap.callocate(1 << 40, 1 << 40).is_null());
}

#[test]
fn callocate_zeroes_every_byte() {
    let mut heap = heap();
    let p = heap.callocate(10, 8);
    assert!(!p.is_null());
    let bytes = unsafe { core::slice::from_raw_parts(p.as_ptr::<u8>(), 80) };
    assert!(bytes.iter().all(|&b| b == 0));
    unsafe { heap.free(p) };
}

#[test]
fn no_overlap_among_live_allocations() {
    let mut heap = heap();
    let sizes = [16u64, 32, 48, 4000, 8, 256];
    let ptrs: Vec<BlockAddr> = sizes.iter().map(|&s| heap.allocate(s)).collect();

    for (i, &a) in ptrs.iter().enumerate() {
        for (j, &b) in ptrs.iter().enumerate() {
            if i != j {
                let (small, small_size, big) = if a < b {
                    (a, sizes[i], b)
                } else {
                    (b, sizes[j], a)
                };
                assert!(small.as_usize() + small_size as usize <= big.as_usize());
            }
        }
    }

    for p in ptrs {
        unsafe { heap.free(p) };
    }
}

#[test]
fn scenario_fill_release_pattern_leaves_a_single_free_block() {
    // Allocate 1000 blocks of varying sizes 16..2048, free every other one, then free the
    // rest. The checker runs around every call above, so this alone exercises invariants
    // 1-11 continuously across a long interleaving of allocations and frees.
    let mut heap = heap();
    let ptrs: Vec<BlockAddr> = (0..1000u64)
        .map(|i| heap.allocate(16 + (i % 128) * 16))
        .collect();

    for (i, &p) in ptrs.iter().enumerate() {
        if i % 2 == 0 {
            unsafe { heap.free(p) };
        }
    }
    for (i, &p) in ptrs.iter().enumerate() {
        if i % 2 == 1 {
            unsafe { heap.free(p) };
        }
    }
}
