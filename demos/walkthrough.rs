use std::{io::Read, ptr::NonNull};

use fitalloc::{Heap, HeapConfig, MmapSource, Policy};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect the process with tools like `pmap` or
/// `gdb` while the heap is in a known state.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_heap(
  label: &str,
  heap: &Heap<MmapSource>,
) {
  println!("[{}] PID = {}, {}", label, std::process::id(), heap.stats());
}

fn print_alloc(
  heap: &Heap<MmapSource>,
  requested: usize,
  ptr: NonNull<u8>,
) {
  println!(
    "Allocated {} bytes (usable {}), address = {:?}",
    requested,
    unsafe { heap.usable_size(ptr) },
    ptr
  );
}

fn main() {
  env_logger::init();

  // Segregated bins, coalescing on both sides: the default configuration.
  let mut heap = Heap::new(MmapSource::new(), HeapConfig::new().with_policy(Policy::Segregated));

  print_heap("start", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Four allocations carved from the first region, back to back.
  // --------------------------------------------------------------------
  println!("\n[1] Allocate 100, 200, 100 and 150 bytes");
  let sizes = [100, 200, 100, 150];
  let mut ptrs = Vec::new();

  for size in sizes {
    let ptr = heap.allocate(size).expect("allocation failed");
    print_alloc(&heap, size, ptr);

    unsafe { ptr.as_ptr().write_bytes(0xAB, size) };
    ptrs.push(ptr);
  }

  print_heap("after [1]", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Free the two middle blocks. The second free finds the first one
  //    through its footer and merges with it.
  // --------------------------------------------------------------------
  println!("\n[2] Free the 200 and the second 100 byte blocks");
  unsafe {
    heap.free(ptrs[1]);
    heap.free(ptrs[2]);
  }

  print_heap("after [2]", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) A 280 byte request fits in the merged hole without growing.
  // --------------------------------------------------------------------
  println!("\n[3] Allocate 280 bytes (check reuse of the merged block)");
  let reused = heap.allocate(280).expect("allocation failed");
  print_alloc(&heap, 280, reused);

  println!(
    "[3] reused == second block? {}",
    if reused == ptrs[1] {
      "Yes, it reused the merged block"
    } else {
      "No, it allocated somewhere else"
    }
  );

  print_heap("after [3]", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) A request larger than anything free acquires a new region sized
  //    for it.
  // --------------------------------------------------------------------
  println!("\n[4] Allocate a 64 KiB block");
  let big = heap.allocate(64 * 1024).expect("allocation failed");
  print_alloc(&heap, 64 * 1024, big);

  print_heap("after [4]", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Free everything. Each region collapses back into a single block.
  // --------------------------------------------------------------------
  unsafe {
    heap.free(ptrs[0]);
    heap.free(ptrs[3]);
    heap.free(reused);
    heap.free(big);
  }

  heap.validate().expect("heap is inconsistent");

  let stats = heap.finalize();
  println!("\n[5] Final report: {}", stats);
  println!("[5] End of example. Process will exit and the OS will reclaim all memory.");
}
