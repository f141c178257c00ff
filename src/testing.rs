//! Shared fixtures for unit tests.

use std::ptr::NonNull;

use crate::{
  block::{Block, BlockState},
  error::{AllocError, Result},
  source::{MemorySource, MmapSource},
};

pub fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Aligned scratch memory for building blocks by hand.
#[repr(C, align(16))]
pub struct Arena<const N: usize>([u8; N]);

impl<const N: usize> Arena<N> {
  pub fn new() -> Self {
    Self([0; N])
  }

  pub fn as_mut_ptr(&mut self) -> *mut u8 {
    self.0.as_mut_ptr()
  }

  /// Lays out allocated blocks of the given payload sizes back to back.
  pub unsafe fn carve(
    &mut self,
    sizes: &[usize],
  ) -> Vec<*mut Block> {
    let mut at = self.as_mut_ptr();
    let mut blocks = Vec::with_capacity(sizes.len());

    for &size in sizes {
      unsafe {
        let block = Block::write(at, size, BlockState::Allocated);
        at = Block::end(block);
        blocks.push(block);
      }
    }

    assert!(at as usize <= self.0.as_ptr() as usize + N);
    blocks
  }
}

/// Memory source recording every region request, optionally refusing after a
/// quota or reporting a page size other than the system's.
pub struct CountingSource {
  inner: MmapSource,
  pub requests: Vec<usize>,
  pub quota: Option<usize>,
  pub page_size: Option<usize>,
}

impl CountingSource {
  pub fn new() -> Self {
    Self {
      inner: MmapSource::new(),
      requests: Vec::new(),
      quota: None,
      page_size: None,
    }
  }

  pub fn with_quota(quota: usize) -> Self {
    Self {
      quota: Some(quota),
      ..Self::new()
    }
  }

  pub fn with_page_size(page_size: usize) -> Self {
    Self {
      page_size: Some(page_size),
      ..Self::new()
    }
  }
}

impl MemorySource for CountingSource {
  fn page_size(&self) -> usize {
    self.page_size.unwrap_or_else(|| self.inner.page_size())
  }

  fn acquire_region(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    if self.quota.is_some_and(|quota| self.requests.len() >= quota) {
      return Err(AllocError::SourceExhausted { size });
    }

    self.requests.push(size);
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
