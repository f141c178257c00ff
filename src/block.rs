//! Block header and boundary-tag layout.
//!
//! Every block in a region looks like this:
//!
//! ```text
//!   ┌──────────────────────────┬─────────────────────────┬──────────────┐
//!   │ Block (header)           │ payload                 │ Footer       │
//!   │ size | state | next|prev │ `size` bytes            │ size | state │
//!   └──────────────────────────┴─────────────────────────┴──────────────┘
//!   ▲                          ▲                         ▲              ▲
//!   block                      Block::payload            Block::footer  Block::end
//! ```
//!
//! All pointer arithmetic between headers, payloads, footers and physical
//! neighbours goes through the functions in this module.

use std::{mem, ptr};

use crate::align::ALIGNMENT;

/// Allocation state of a block. This is the only record of whether a block is free.
#[repr(usize)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
  Free = 0,
  Allocated = 1,
}

#[repr(C)]
pub struct Block {
  pub size: usize,
  pub state: BlockState,
  pub next: *mut Block,
  pub prev: *mut Block,
}

/// Boundary tag duplicating the header's size and state at the end of the block.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Footer {
  pub size: usize,
  pub state: BlockState,
}

pub const HEADER_SIZE: usize = mem::size_of::<Block>();
pub const FOOTER_SIZE: usize = mem::size_of::<Footer>();

/// Metadata bytes carried by every block besides its payload.
pub const BLOCK_OVERHEAD: usize = HEADER_SIZE + FOOTER_SIZE;

/// Smallest payload a block can have.
pub const MIN_PAYLOAD: usize = ALIGNMENT;

const _: () = assert!(HEADER_SIZE % ALIGNMENT == 0);
const _: () = assert!(FOOTER_SIZE % ALIGNMENT == 0);

impl Block {
  /// Writes a header with unlinked bin pointers at `at`, and its footer.
  ///
  /// # Safety
  ///
  /// `at` must be aligned and `HEADER_SIZE + size + FOOTER_SIZE` bytes from it
  /// must be writable memory owned by the heap.
  pub unsafe fn write(
    at: *mut u8,
    size: usize,
    state: BlockState,
  ) -> *mut Block {
    unsafe {
      let block = at.cast::<Block>();
      block.write(Block {
        size,
        state,
        next: ptr::null_mut(),
        prev: ptr::null_mut(),
      });
      Block::sync_footer(block);
      block
    }
  }

  pub unsafe fn payload(block: *mut Block) -> *mut u8 {
    unsafe { block.cast::<u8>().add(HEADER_SIZE) }
  }

  pub unsafe fn from_payload(ptr: *mut u8) -> *mut Block {
    unsafe { ptr.sub(HEADER_SIZE).cast() }
  }

  pub unsafe fn footer(block: *mut Block) -> *mut Footer {
    unsafe { Block::payload(block).add((*block).size).cast() }
  }

  /// First byte past the footer, i.e. where the right neighbour's header starts.
  pub unsafe fn end(block: *mut Block) -> *mut u8 {
    unsafe { Block::footer(block).cast::<u8>().add(FOOTER_SIZE) }
  }

  pub unsafe fn is_free(block: *mut Block) -> bool {
    unsafe { (*block).state == BlockState::Free }
  }

  pub unsafe fn sync_footer(block: *mut Block) {
    unsafe {
      Block::footer(block).write(Footer {
        size: (*block).size,
        state: (*block).state,
      });
    }
  }

  /// Changes the payload size and moves the footer to the new end.
  pub unsafe fn resize(
    block: *mut Block,
    size: usize,
  ) {
    unsafe {
      (*block).size = size;
      Block::sync_footer(block);
    }
  }

  pub unsafe fn set_state(
    block: *mut Block,
    state: BlockState,
  ) {
    unsafe {
      (*block).state = state;
      (*Block::footer(block)).state = state;
    }
  }

  /// Header of the physically following block (possibly the region's end fence).
  pub unsafe fn right(block: *mut Block) -> *mut Block {
    unsafe { Block::end(block).cast() }
  }

  /// Footer of the physically preceding block (possibly the region's start fence).
  pub unsafe fn preceding_footer(block: *mut Block) -> *mut Footer {
    unsafe { block.cast::<u8>().sub(FOOTER_SIZE).cast() }
  }

  /// Header of the physically preceding block, located through its footer.
  ///
  /// # Safety
  ///
  /// The preceding footer must belong to a real block, not to the start fence.
  pub unsafe fn left(block: *mut Block) -> *mut Block {
    unsafe {
      let footer = Block::preceding_footer(block);
      footer.cast::<u8>().sub((*footer).size + HEADER_SIZE).cast()
    }
  }
}
