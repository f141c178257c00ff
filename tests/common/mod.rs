use std::ptr::NonNull;

use fitalloc::{AllocError, Heap, HeapConfig, MemorySource, MmapSource};

pub fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// `MmapSource` that remembers the size of every region it hands out.
#[derive(Default)]
pub struct RecordingSource {
  inner: MmapSource,
  pub regions: Vec<usize>,
}

impl MemorySource for RecordingSource {
  fn page_size(&self) -> usize {
    self.inner.page_size()
  }

  fn acquire_region(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    self.regions.push(size);
    self.inner.acquire_region(size)
  }

  unsafe fn release_region(
    &mut self,
    ptr: NonNull<u8>,
    size: usize,
  ) {
    unsafe { self.inner.release_region(ptr, size) }
  }
}

pub fn heap(config: HeapConfig) -> Heap<RecordingSource> {
  init_logger();
  Heap::new(RecordingSource::default(), config)
}
