//! Free-space index: the bins holding every free block.
//!
//! Bins are intrusive doubly-linked lists threaded through the `next`/`prev`
//! fields of free block headers. Which bin a block belongs to is a function of
//! its payload size and the heap's [`Policy`]:
//!
//! ```text
//!   FirstFit / BestFit / WorstFit   bin 0 holds everything
//!
//!   QuickFit                        bin 0      general list
//!                                   bin 1..=8  exactly 1..=8 alignment units
//!
//!   Segregated                      bin 0..16  exactly 1..=16 alignment units (LIFO)
//!                                   bin 16..20 (256, 512] (512, 1K] (1K, 2K] (2K, ..)
//!                                              kept sorted by size
//! ```
//!
//! (Byte figures are for 64-bit targets, where the alignment unit is 16.)

use std::{marker::PhantomData, ptr};

use crate::{
  align::ALIGNMENT,
  block::{Block, BlockState},
  placement::Policy,
};

pub const GENERAL_BIN: usize = 0;

pub const SMALL_BIN_COUNT: usize = 16;
pub const LARGE_BIN_COUNT: usize = 4;
pub const BIN_COUNT: usize = SMALL_BIN_COUNT + LARGE_BIN_COUNT;

/// Largest payload served by an exact-size small bin.
pub const SMALL_BIN_LIMIT: usize = SMALL_BIN_COUNT * ALIGNMENT;

/// Number of hot sizes with a dedicated quick-fit list.
pub const QUICK_SIZE_COUNT: usize = 8;

/// Segregated size class of an aligned payload size.
pub fn size_class(size: usize) -> usize {
  if size <= SMALL_BIN_LIMIT {
    return (size.max(ALIGNMENT) - 1) / ALIGNMENT;
  }

  let mut bound = SMALL_BIN_LIMIT * 2;

  for class in SMALL_BIN_COUNT..BIN_COUNT - 1 {
    if size <= bound {
      return class;
    }
    bound *= 2;
  }

  BIN_COUNT - 1
}

/// Quick-fit list for `size`, if it is one of the hot sizes.
pub fn quick_slot(size: usize) -> Option<usize> {
  let hot = size >= ALIGNMENT && size <= QUICK_SIZE_COUNT * ALIGNMENT && size % ALIGNMENT == 0;

  hot.then(|| size / ALIGNMENT)
}

pub struct FreeIndex {
  policy: Policy,
  bins: [*mut Block; BIN_COUNT],
  len: usize,
}

impl FreeIndex {
  pub const fn new(policy: Policy) -> Self {
    Self {
      policy,
      bins: [ptr::null_mut(); BIN_COUNT],
      len: 0,
    }
  }

  pub fn policy(&self) -> Policy {
    self.policy
  }

  /// Number of free blocks across all bins.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn bin_of(
    &self,
    size: usize,
  ) -> usize {
    match self.policy {
      Policy::FirstFit | Policy::BestFit | Policy::WorstFit => GENERAL_BIN,
      Policy::QuickFit => quick_slot(size).unwrap_or(GENERAL_BIN),
      Policy::Segregated => size_class(size),
    }
  }

  /// Whether `bin` is kept in ascending size order.
  pub fn is_sorted(
    &self,
    bin: usize,
  ) -> bool {
    self.policy == Policy::Segregated && bin >= SMALL_BIN_COUNT
  }

  pub fn head(
    &self,
    bin: usize,
  ) -> *mut Block {
    self.bins[bin]
  }

  /// Blocks of one bin, in list order.
  pub fn bin(
    &self,
    bin: usize,
  ) -> BinIter<'_> {
    BinIter {
      current: self.bins[bin],
      _index: PhantomData,
    }
  }

  /// Every free block with the bin it is linked into.
  pub fn iter(&self) -> impl Iterator<Item = (usize, *mut Block)> + '_ {
    (0..BIN_COUNT).flat_map(move |bin| self.bin(bin).map(move |block| (bin, block)))
  }

  /// Marks `block` free and links it into the bin matching its size.
  ///
  /// # Safety
  ///
  /// `block` must be a valid header that is not currently linked into any bin.
  pub unsafe fn insert(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      Block::set_state(block, BlockState::Free);

      let bin = self.bin_of((*block).size);

      let mut prev: *mut Block = ptr::null_mut();
      let mut next = self.bins[bin];

      if self.is_sorted(bin) {
        while !next.is_null() && (*next).size < (*block).size {
          prev = next;
          next = (*next).next;
        }
      }

      (*block).prev = prev;
      (*block).next = next;

      if prev.is_null() {
        self.bins[bin] = block;
      } else {
        (*prev).next = block;
      }

      if !next.is_null() {
        (*next).prev = block;
      }

      self.len += 1;
    }
  }

  /// Unlinks `block` from its bin and marks it allocated.
  ///
  /// # Safety
  ///
  /// `block` must currently be linked into this index, with the same size it
  /// had when it was inserted.
  pub unsafe fn remove(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      debug_assert!(Block::is_free(block));

      let prev = (*block).prev;
      let next = (*block).next;

      if prev.is_null() {
        let bin = self.bin_of((*block).size);
        debug_assert_eq!(self.bins[bin], block);
        self.bins[bin] = next;
      } else {
        (*prev).next = next;
      }

      if !next.is_null() {
        (*next).prev = prev;
      }

      (*block).next = ptr::null_mut();
      (*block).prev = ptr::null_mut();
      Block::set_state(block, BlockState::Allocated);

      self.len -= 1;
    }
  }
}

pub struct BinIter<'a> {
  current: *mut Block,
  _index: PhantomData<&'a FreeIndex>,
}

impl Iterator for BinIter<'_> {
  type Item = *mut Block;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let block = self.current;
    // Linked blocks stay valid while the index is borrowed.
    self.current = unsafe { (*block).next };
    Some(block)
  }
}
