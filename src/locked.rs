use std::{
  alloc::{GlobalAlloc, Layout},
  ptr::{self, NonNull},
};

use log::debug;
use spin::{Mutex, MutexGuard};

use crate::{align::ALIGNMENT, config::HeapConfig, heap::Heap, source::MemorySource};

/// A [`Heap`] behind a spin lock, usable as `#[global_allocator]`.
///
/// Every call takes the lock for its whole duration, so the heap never
/// observes two operations at once.
///
/// ```rust,no_run
/// use fitalloc::{HeapConfig, LockedHeap, MmapSource};
///
/// #[global_allocator]
/// static HEAP: LockedHeap<MmapSource> = LockedHeap::new(MmapSource::new(), HeapConfig::new());
///
/// fn main() {
///   let v = vec![1u8, 2, 3];
///   assert_eq!(v.len(), 3);
/// }
/// ```
///
/// The wrapped heap runs with [`HeapConfig::logging`] off, since a logger that
/// allocates would re-enter the lock. Growth is logged here instead, once the
/// lock is released.
pub struct LockedHeap<S: MemorySource>(Mutex<Heap<S>>);

impl<S: MemorySource> LockedHeap<S> {
  pub const fn new(
    source: S,
    config: HeapConfig,
  ) -> Self {
    Self(Mutex::new(Heap::new(source, config.with_logging(false))))
  }

  pub fn lock(&self) -> MutexGuard<'_, Heap<S>> {
    self.0.lock()
  }
}

unsafe impl<S: MemorySource + Send> GlobalAlloc for LockedHeap<S> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    // Payloads are only ever aligned to the heap's alignment unit.
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }

    let (result, grown) = {
      let mut heap = self.lock();
      let before = heap.region_bytes();
      let result = heap.allocate(layout.size());

      (result, heap.region_bytes() - before)
    };

    if grown > 0 {
      debug!("grew heap by {} bytes for a {} byte allocation", grown, layout.size());
    }

    result.map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    _layout: Layout,
  ) {
    if let Some(ptr) = NonNull::new(ptr) {
      unsafe { self.lock().free(ptr) };
    }
  }
}
