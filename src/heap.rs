use std::ptr::{self, NonNull};

use log::{debug, trace};

use crate::{
  align::{ALIGNMENT, checked_align_to},
  block::{BLOCK_OVERHEAD, Block, BlockState, MIN_PAYLOAD},
  coalesce::{Coalescing, coalesce},
  config::HeapConfig,
  error::{AllocError, HeapError, Result},
  index::FreeIndex,
  placement,
  region::{REGION_OVERHEAD, Region, Regions},
  source::MemorySource,
  split::split,
  stats::HeapStats,
};

/// A growable heap carved out of regions from a [`MemorySource`].
///
/// The heap is plain single-threaded state: every operation takes `&mut self`
/// and runs to completion. Wrap it in a lock (see
/// [`LockedHeap`](crate::LockedHeap)) to share it between threads.
pub struct Heap<S: MemorySource> {
  source: S,
  config: HeapConfig,
  index: FreeIndex,
  regions: *mut Region,
  region_count: usize,
  region_bytes: usize,
}

// The raw pointers only ever point into regions owned by this heap.
unsafe impl<S: MemorySource + Send> Send for Heap<S> {}

impl<S: MemorySource> Heap<S> {
  pub const fn new(
    source: S,
    config: HeapConfig,
  ) -> Self {
    Self {
      source,
      index: FreeIndex::new(config.policy),
      config,
      regions: ptr::null_mut(),
      region_count: 0,
      region_bytes: 0,
    }
  }

  /// Resets the heap to empty: no regions, no free blocks.
  ///
  /// Regions acquired before the reset are forgotten, not released, so this
  /// is meant to be called before the first allocation.
  pub fn initialize(&mut self) {
    self.index = FreeIndex::new(self.config.policy);
    self.regions = ptr::null_mut();
    self.region_count = 0;
    self.region_bytes = 0;
  }

  pub fn config(&self) -> &HeapConfig {
    &self.config
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Total bytes of all regions acquired so far.
  pub fn region_bytes(&self) -> usize {
    self.region_bytes
  }

  /// Returns a pointer to at least `size` usable bytes, aligned to
  /// [`ALIGNMENT`].
  ///
  /// A zero `size` is served as a minimum-size allocation: the pointer is
  /// unique, writable for [`ALIGNMENT`] bytes and must be freed like any other.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let size = checked_align_to(size.max(MIN_PAYLOAD), ALIGNMENT)
      .ok_or(AllocError::RequestTooLarge { size })?;

    let mut grown = false;

    loop {
      if let Some(block) = placement::select(&self.index, size) {
        return Ok(unsafe { self.take(block.as_ptr(), size) });
      }

      // A fresh region always fits the request, so a second miss is a bug in
      // the source or the index.
      if grown {
        return Err(AllocError::OutOfMemory { requested: size });
      }

      self.grow(size)?;
      grown = true;
    }
  }

  /// Releases an allocation and merges it with free neighbours.
  ///
  /// # Safety
  ///
  /// `ptr` must have been returned by [`allocate`](Heap::allocate) on this
  /// heap and not freed since. Anything else corrupts the heap; only debug
  /// builds check it.
  pub unsafe fn free(
    &mut self,
    ptr: NonNull<u8>,
  ) {
    unsafe {
      let block = Block::from_payload(ptr.as_ptr());

      debug_assert!(!Block::is_free(block), "double free of {:p}", ptr);
      debug_assert!(self.spans_one_region(block), "{:p} was not allocated by this heap", ptr);
      debug_assert!(self.neighbours_in_region(block), "{:p} has corrupted neighbours", ptr);

      let survivor = coalesce(&mut self.index, block, self.config.coalescing);

      debug_assert!(self.spans_one_region(survivor));

      if self.config.logging {
        trace!(
          "released {:p} into free block {:p} ({} bytes)",
          block,
          survivor,
          (*survivor).size
        );
      }
    }
  }

  /// Payload bytes behind a live allocation. Can exceed the requested size
  /// when the block was too small to split.
  ///
  /// # Safety
  ///
  /// `ptr` must be a live allocation of this heap.
  pub unsafe fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { (*Block::from_payload(ptr.as_ptr())).size }
  }

  /// Drops all bookkeeping and returns a final report. Regions are not given
  /// back to the source; the heap is empty afterwards, as after
  /// [`initialize`](Heap::initialize).
  pub fn finalize(&mut self) -> HeapStats {
    let stats = self.stats();

    if self.config.logging {
      debug!("finalize: {}", stats);
    }

    self.initialize();
    stats
  }

  pub fn stats(&self) -> HeapStats {
    let mut stats = HeapStats {
      regions: self.region_count,
      region_bytes: self.region_bytes,
      overhead_bytes: self.region_count * REGION_OVERHEAD,
      ..HeapStats::default()
    };

    for region in self.regions() {
      for block in unsafe { Region::blocks(region) } {
        let size = unsafe { (*block).size };
        stats.overhead_bytes += BLOCK_OVERHEAD;

        if unsafe { Block::is_free(block) } {
          stats.free_blocks += 1;
          stats.free_bytes += size;
          stats.largest_free = stats.largest_free.max(size);
        } else {
          stats.allocated_blocks += 1;
          stats.allocated_bytes += size;
        }
      }
    }

    stats
  }

  /// Cross-checks regions, boundary tags and the free-space index.
  ///
  /// Walks every block, so it is meant for tests and debugging. It does not
  /// allocate, so it is safe to call on a heap backing the global allocator.
  pub fn validate(&self) -> core::result::Result<(), HeapError> {
    let mut walked_free = 0;

    for region in self.regions() {
      unsafe {
        let fence = Region::end_fence(region);
        let mut cursor = Region::first_block(region);
        let mut previous_free: Option<*mut Block> = None;

        while cursor < fence {
          if Block::end(cursor) > fence.cast() {
            return Err(HeapError::RegionOverrun { region: region as usize });
          }

          let footer = *Block::footer(cursor);
          if footer.size != (*cursor).size || footer.state != (*cursor).state {
            return Err(HeapError::FooterMismatch { block: cursor as usize });
          }

          if Block::is_free(cursor) {
            walked_free += 1;

            let bin = self.index.bin_of((*cursor).size);
            if !self.index.bin(bin).take(self.index.len()).any(|b| b == cursor) {
              return Err(HeapError::UnindexedFreeBlock { block: cursor as usize });
            }

            if let Some(left) = previous_free {
              if self.config.coalescing == Coalescing::Both {
                return Err(HeapError::UncoalescedNeighbours {
                  left: left as usize,
                  right: cursor as usize,
                });
              }
            }

            previous_free = Some(cursor);
          } else {
            previous_free = None;
          }

          cursor = Block::right(cursor);
        }

        if cursor != fence {
          return Err(HeapError::RegionOverrun { region: region as usize });
        }
      }
    }

    let mut indexed = 0;

    // Bounded so that a corrupted, cyclic bin still terminates.
    for (bin, block) in self.index.iter().take(self.index.len() + 1) {
      indexed += 1;

      let (size, free) = unsafe { ((*block).size, Block::is_free(block)) };

      if !free {
        return Err(HeapError::IndexedAllocatedBlock { block: block as usize });
      }

      let expected = self.index.bin_of(size);
      if bin != expected {
        return Err(HeapError::WrongBin {
          block: block as usize,
          size,
          bin,
          expected,
        });
      }
    }

    if indexed != walked_free || self.index.len() != walked_free {
      return Err(HeapError::FreeCountMismatch {
        indexed: indexed.max(self.index.len()),
        walked: walked_free,
      });
    }

    Ok(())
  }

  pub(crate) fn regions(&self) -> Regions {
    Regions { current: self.regions }
  }

  /// Unlinks a selected block, trims it to `size` and hands out its payload.
  unsafe fn take(
    &mut self,
    block: *mut Block,
    size: usize,
  ) -> NonNull<u8> {
    unsafe {
      self.index.remove(block);

      let leftover = split(&mut self.index, block, size);

      if let Some(leftover) = leftover.filter(|_| self.config.logging) {
        trace!(
          "split {:p} at {} bytes, leftover {:p} ({} bytes)",
          block,
          size,
          leftover,
          (*leftover).size
        );
      }

      NonNull::new_unchecked(Block::payload(block))
    }
  }

  /// Acquires a region able to hold a `size` byte payload and files it as one
  /// free block.
  fn grow(
    &mut self,
    size: usize,
  ) -> Result<()> {
    let len = Region::size_for(size, &self.config, self.source.page_size())
      .ok_or(AllocError::RequestTooLarge { size })?;

    if let Some(limit) = self.config.max_heap_bytes {
      if self.region_bytes.saturating_add(len) > limit {
        if self.config.logging {
          debug!(
            "refusing to grow by {} bytes: heap limit of {} bytes reached ({} in use)",
            len, limit, self.region_bytes
          );
        }
        return Err(AllocError::OutOfMemory { requested: size });
      }
    }

    let base = self.source.acquire_region(len).inspect_err(|err| {
      if self.config.logging {
        debug!("memory source refused a {} byte region: {}", len, err);
      }
    })?;
    debug_assert_eq!(base.as_ptr() as usize % ALIGNMENT, 0);

    unsafe {
      let (region, block) = Region::init(base.as_ptr(), len, self.regions);
      self.regions = region;
      self.index.insert(block);
    }

    self.region_count += 1;
    self.region_bytes += len;

    if self.config.logging {
      debug!(
        "grew heap by {} bytes at {:p} for a {} byte request ({} regions, {} bytes)",
        len, base, size, self.region_count, self.region_bytes
      );
    }

    Ok(())
  }

  /// Whether `block` lies wholly inside one of the heap's regions.
  fn spans_one_region(
    &self,
    block: *mut Block,
  ) -> bool {
    self.regions().any(|region| unsafe {
      Region::contains(region, block.cast::<u8>())
        && Block::end(block) <= Region::end_fence(region).cast()
    })
  }

  /// Whether the neighbours `coalesce` would read around `block` lie inside
  /// the block's region: the right header at most at the end fence, and a
  /// left block flagged free by the preceding footer at or after the first
  /// block.
  unsafe fn neighbours_in_region(
    &self,
    block: *mut Block,
  ) -> bool {
    unsafe {
      let owner = self.regions().find(|&region| Region::contains(region, block.cast::<u8>()));

      let Some(region) = owner else {
        return false;
      };

      let first = Region::first_block(region) as usize;
      let fence = Region::end_fence(region) as usize;

      let footer = *Block::preceding_footer(block);
      let left_in_region = footer.state != BlockState::Free
        || (block as usize)
          .checked_sub(footer.size.saturating_add(BLOCK_OVERHEAD))
          .is_some_and(|left| left >= first);

      Block::end(block) as usize <= fence && left_in_region
    }
  }
}

impl<S: MemorySource + Default> Default for Heap<S> {
  fn default() -> Self {
    Self::new(S::default(), HeapConfig::default())
  }
}
