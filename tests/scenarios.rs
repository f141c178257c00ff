mod common;

use std::ptr::NonNull;

use common::heap;
use fitalloc::{BLOCK_OVERHEAD, Coalescing, HeapConfig, Policy, REGION_OVERHEAD};

#[test]
fn best_fit_takes_smallest_sufficient_block() {
  let mut heap = heap(HeapConfig::new().with_policy(Policy::BestFit));

  let a = heap.allocate(100).unwrap();
  let _g1 = heap.allocate(16).unwrap();
  let b = heap.allocate(200).unwrap();
  let _g2 = heap.allocate(16).unwrap();
  let c = heap.allocate(50).unwrap();
  let _g3 = heap.allocate(16).unwrap();

  unsafe {
    heap.free(b);
    heap.free(a);
    heap.free(c);
  }

  assert_eq!(heap.allocate(150).unwrap(), b);
  heap.validate().unwrap();
}

#[test]
fn worst_fit_takes_largest_block() {
  let mut heap = heap(HeapConfig::new().with_policy(Policy::WorstFit));

  let a = heap.allocate(100).unwrap();
  let _g1 = heap.allocate(16).unwrap();
  let b = heap.allocate(500).unwrap();
  let _g2 = heap.allocate(16).unwrap();
  let c = heap.allocate(200).unwrap();
  let _g3 = heap.allocate(16).unwrap();

  // Use up the rest of the region so only the three freed blocks compete.
  let rest = heap.stats().largest_free;
  let _tail = heap.allocate(rest).unwrap();
  assert_eq!(heap.stats().free_blocks, 0);

  unsafe {
    heap.free(a);
    heap.free(b);
    heap.free(c);
  }

  assert_eq!(heap.allocate(50).unwrap(), b);
  assert_eq!(heap.source().regions.len(), 1);
  heap.validate().unwrap();
}

#[test]
fn neighbouring_frees_merge_into_one_reusable_block() {
  let mut heap = heap(HeapConfig::new().with_policy(Policy::FirstFit));

  let ptr1 = heap.allocate(100).unwrap();
  let ptr2 = heap.allocate(200).unwrap();
  let ptr3 = heap.allocate(100).unwrap();
  let ptr4 = heap.allocate(150).unwrap();

  unsafe {
    heap.free(ptr2);
    heap.free(ptr3);
  }

  let ptr5 = heap.allocate(280).unwrap();

  assert_eq!(ptr5, ptr2);
  assert_eq!(heap.source().regions.len(), 1);

  unsafe {
    heap.free(ptr1);
    heap.free(ptr4);
    heap.free(ptr5);
  }

  heap.validate().unwrap();
}

#[test]
fn left_only_coalescing_merges_downward() {
  let mut heap = heap(
    HeapConfig::new()
      .with_policy(Policy::FirstFit)
      .with_coalescing(Coalescing::Left),
  );

  let ptr1 = heap.allocate(100).unwrap();
  let ptr2 = heap.allocate(200).unwrap();
  let _ptr3 = heap.allocate(100).unwrap();

  unsafe {
    heap.free(ptr1);
    heap.free(ptr2);
  }

  assert_eq!(heap.allocate(280).unwrap(), ptr1);
  heap.validate().unwrap();
}

#[test]
fn right_only_coalescing_merges_upward() {
  let mut heap = heap(
    HeapConfig::new()
      .with_policy(Policy::FirstFit)
      .with_coalescing(Coalescing::Right),
  );

  let ptr1 = heap.allocate(100).unwrap();
  let ptr2 = heap.allocate(200).unwrap();
  let _ptr3 = heap.allocate(100).unwrap();

  unsafe {
    heap.free(ptr2);
    heap.free(ptr1);
  }

  assert_eq!(heap.allocate(280).unwrap(), ptr1);
  heap.validate().unwrap();
}

#[test]
fn without_coalescing_fragments_stay_apart() {
  let mut heap = heap(
    HeapConfig::new()
      .with_policy(Policy::BestFit)
      .with_coalescing(Coalescing::Disabled),
  );

  let ptr1 = heap.allocate(100).unwrap();
  let ptr2 = heap.allocate(200).unwrap();
  let _ptr3 = heap.allocate(100).unwrap();

  let before = heap.stats().free_blocks;

  unsafe {
    heap.free(ptr1);
    heap.free(ptr2);
  }

  assert_eq!(heap.stats().free_blocks, before + 2);

  let ptr4 = heap.allocate(280).unwrap();
  assert_ne!(ptr4, ptr1);
  assert_ne!(ptr4, ptr2);
  heap.validate().unwrap();
}

#[test]
fn growth_happens_once_per_oversized_request() {
  let mut heap = heap(HeapConfig::new());

  heap.allocate(64).unwrap();
  assert_eq!(heap.source().regions.len(), 1);

  let largest = heap.stats().largest_free;
  let big = heap.allocate(largest + 1).unwrap();

  let regions = &heap.source().regions;
  assert_eq!(regions.len(), 2);
  assert!(regions[1] >= largest + 1 + BLOCK_OVERHEAD + REGION_OVERHEAD);
  unsafe { assert!(heap.usable_size(big) > largest) };

  // The old region's space is still there for small requests.
  heap.allocate(64).unwrap();
  assert_eq!(heap.source().regions.len(), 2);
  heap.validate().unwrap();
}

#[test]
fn payloads_are_aligned_and_writable() {
  for policy in [Policy::FirstFit, Policy::Segregated, Policy::QuickFit] {
    let mut heap = heap(HeapConfig::new().with_policy(policy));
    let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

    for size in [1, 7, 16, 33, 128, 129, 1000, 5000] {
      let ptr = heap.allocate(size).unwrap();
      assert_eq!(ptr.as_ptr() as usize % fitalloc::align::ALIGNMENT, 0);

      unsafe { ptr.as_ptr().write_bytes(size as u8, size) };
      live.push((ptr, size));
    }

    for (ptr, size) in live {
      unsafe {
        assert!((0..size).all(|i| *ptr.as_ptr().add(i) == size as u8));
        heap.free(ptr);
      }
    }

    heap.validate().unwrap();
  }
}
