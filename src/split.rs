use crate::{
  block::{BLOCK_OVERHEAD, Block, BlockState},
  index::FreeIndex,
};

/// Trims `block` down to `size` bytes of payload and files the remainder as a
/// new free block right after it.
///
/// The remainder is only split off when it can hold its own header and footer
/// plus at least one byte of payload; otherwise the block keeps every byte and
/// the caller gets a little more than it asked for. Returns the leftover block
/// if one was created.
///
/// # Safety
///
/// `block` must be a valid block that is not linked into `index`, with
/// `(*block).size >= size` and `size` aligned.
pub unsafe fn split(
  index: &mut FreeIndex,
  block: *mut Block,
  size: usize,
) -> Option<*mut Block> {
  unsafe {
    let total = (*block).size;
    debug_assert!(total >= size);

    let remaining = total - size;

    if remaining <= BLOCK_OVERHEAD {
      return None;
    }

    Block::resize(block, size);

    let leftover = Block::write(
      Block::end(block),
      remaining - BLOCK_OVERHEAD,
      BlockState::Allocated,
    );
    index.insert(leftover);

    Some(leftover)
  }
}
