use std::ptr::{self, NonNull};

use crate::error::{AllocError, Result};

/// Provider of page-granular memory regions for the heap to carve up.
///
/// The heap only ever calls [`acquire_region`](MemorySource::acquire_region);
/// `release_region` exists for owners that tear a heap down by hand.
pub trait MemorySource {
  /// Granularity regions are rounded up to.
  fn page_size(&self) -> usize;

  /// Returns a zeroed region of at least `size` bytes, aligned to at least
  /// [`ALIGNMENT`](crate::align::ALIGNMENT).
  fn acquire_region(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>>;

  /// # Safety
  ///
  /// `ptr` and `size` must describe a region previously returned by
  /// `acquire_region` on this source, and nothing may still point into it.
  unsafe fn release_region(
    &mut self,
    ptr: NonNull<u8>,
    size: usize,
  );
}

/// Anonymous private mappings straight from the kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct MmapSource;

impl MmapSource {
  pub const fn new() -> Self {
    Self
  }
}

impl MemorySource for MmapSource {
  fn page_size(&self) -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if size <= 0 { 4096 } else { size as usize }
  }

  fn acquire_region(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let address = unsafe {
      libc::mmap(
        ptr::null_mut(),
        size,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == libc::MAP_FAILED {
      return Err(AllocError::SourceExhausted { size });
    }

    NonNull::new(address.cast::<u8>()).ok_or(AllocError::SourceExhausted { size })
  }

  unsafe fn release_region(
    &mut self,
    ptr: NonNull<u8>,
    size: usize,
  ) {
    unsafe {
      libc::munmap(ptr.as_ptr().cast(), size);
    }
  }
}
