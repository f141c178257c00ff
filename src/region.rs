//! Layout of a region acquired from the memory source.
//!
//! ```text
//!   base                                                              base + len
//!   ┌────────┬─────────────┬───────┬───────┬─── ─ ─ ─┬───────┬─────────────┐
//!   │ Region │ start fence │ block │ block │   ...    │ block │ end fence   │
//!   │ header │ (Footer)    │       │       │          │       │ (Block hdr) │
//!   └────────┴─────────────┴───────┴───────┴─── ─ ─ ─┴───────┴─────────────┘
//! ```
//!
//! Both fences are zero-size tags marked allocated. The coalescer reads the
//! footer below a block and the header above it, so at the edges of a region
//! it sees a fence and never looks outside `base..base + len`.

use std::{mem, ptr};

use crate::{
  align::checked_align_to,
  block::{BLOCK_OVERHEAD, Block, BlockState, FOOTER_SIZE, Footer, HEADER_SIZE, MIN_PAYLOAD},
  config::HeapConfig,
};

#[repr(C)]
pub struct Region {
  pub len: usize,
  pub next: *mut Region,
}

pub const REGION_HEADER_SIZE: usize = mem::size_of::<Region>();

/// Bytes of every region not available to blocks: header and both fences.
pub const REGION_OVERHEAD: usize = REGION_HEADER_SIZE + FOOTER_SIZE + HEADER_SIZE;

/// Smallest region that still fits one minimal block.
pub const MIN_REGION_SIZE: usize = REGION_OVERHEAD + BLOCK_OVERHEAD + MIN_PAYLOAD;

impl Region {
  /// Writes the region header and fences over `base..base + len` and returns
  /// the region with the single block spanning all of its usable space. The
  /// block is marked allocated and not linked anywhere yet.
  ///
  /// # Safety
  ///
  /// `base` must be aligned, `len` bytes from it writable and owned by the
  /// heap, and `len` a multiple of the alignment unit of at least
  /// [`MIN_REGION_SIZE`].
  pub unsafe fn init(
    base: *mut u8,
    len: usize,
    next: *mut Region,
  ) -> (*mut Region, *mut Block) {
    debug_assert!(len >= MIN_REGION_SIZE);

    unsafe {
      let region = base.cast::<Region>();
      region.write(Region { len, next });

      base.add(REGION_HEADER_SIZE).cast::<Footer>().write(Footer {
        size: 0,
        state: BlockState::Allocated,
      });

      Region::end_fence(region).write(Block {
        size: 0,
        state: BlockState::Allocated,
        next: ptr::null_mut(),
        prev: ptr::null_mut(),
      });

      let first = Block::write(
        Region::first_block(region).cast(),
        len - REGION_OVERHEAD - BLOCK_OVERHEAD,
        BlockState::Allocated,
      );

      (region, first)
    }
  }

  pub unsafe fn first_block(region: *mut Region) -> *mut Block {
    unsafe { region.cast::<u8>().add(REGION_HEADER_SIZE + FOOTER_SIZE).cast() }
  }

  pub unsafe fn end_fence(region: *mut Region) -> *mut Block {
    unsafe { region.cast::<u8>().add((*region).len - HEADER_SIZE).cast() }
  }

  /// Whether `addr` lies in the block area, between the two fences.
  pub unsafe fn contains(
    region: *mut Region,
    addr: *const u8,
  ) -> bool {
    unsafe {
      let low = Region::first_block(region) as usize;
      let high = Region::end_fence(region) as usize;

      (low..high).contains(&(addr as usize))
    }
  }

  /// Blocks of the region in address order, fences excluded.
  pub unsafe fn blocks(region: *mut Region) -> RegionBlocks {
    unsafe {
      RegionBlocks {
        current: Region::first_block(region),
        fence: Region::end_fence(region),
      }
    }
  }

  /// Region length needed to serve a payload of `size` bytes.
  ///
  /// Small requests get `min_region_size`; anything that does not fit there
  /// gets its own region with `large_region_slack` bytes of headroom. Both are
  /// rounded up to `page_size`. `None` when the arithmetic overflows.
  pub fn size_for(
    size: usize,
    config: &HeapConfig,
    page_size: usize,
  ) -> Option<usize> {
    let needed = size.checked_add(BLOCK_OVERHEAD + REGION_OVERHEAD)?;
    let min_region = checked_align_to(config.min_region_size.max(MIN_REGION_SIZE), page_size)?;

    if needed <= min_region {
      return Some(min_region);
    }

    checked_align_to(needed.checked_add(config.large_region_slack)?, page_size)
  }
}

pub struct RegionBlocks {
  current: *mut Block,
  fence: *mut Block,
}

impl Iterator for RegionBlocks {
  type Item = *mut Block;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current >= self.fence {
      return None;
    }

    let block = self.current;
    self.current = unsafe { Block::right(block) };
    Some(block)
  }
}

/// Walks the intrusive list of regions, newest first.
pub struct Regions {
  pub(crate) current: *mut Region,
}

impl Iterator for Regions {
  type Item = *mut Region;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let region = self.current;
    self.current = unsafe { (*region).next };
    Some(region)
  }
}
