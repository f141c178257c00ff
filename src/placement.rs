use std::ptr::NonNull;

use crate::{
  block::Block,
  index::{BIN_COUNT, FreeIndex, GENERAL_BIN, QUICK_SIZE_COUNT, quick_slot},
};

/// Rule used to pick the free block that serves a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Policy {
  /// First block in the free list that is large enough.
  FirstFit,
  /// Smallest sufficient block; earliest wins ties, stops at an exact fit.
  BestFit,
  /// Largest sufficient block; earliest wins ties.
  WorstFit,
  /// Exact-size small bins plus size-sorted large bins, searched upward from
  /// the request's size class.
  #[default]
  Segregated,
  /// Dedicated lists for a few hot sizes in front of a first-fit general list.
  QuickFit,
}

/// Picks a free block with a payload of at least `size` bytes.
///
/// The index is only read; unlinking the block is the caller's job.
pub fn select(
  index: &FreeIndex,
  size: usize,
) -> Option<NonNull<Block>> {
  match index.policy() {
    Policy::FirstFit => first_fit(index.bin(GENERAL_BIN), size),
    Policy::BestFit => best_fit(index.bin(GENERAL_BIN), size),
    Policy::WorstFit => worst_fit(index.bin(GENERAL_BIN), size),
    Policy::Segregated => segregated(index, size),
    Policy::QuickFit => quick_fit(index, size),
  }
}

fn payload_size(block: *mut Block) -> usize {
  // Only blocks linked into the index reach the fit functions.
  unsafe { (*block).size }
}

fn first_fit(
  mut blocks: impl Iterator<Item = *mut Block>,
  size: usize,
) -> Option<NonNull<Block>> {
  blocks.find(|&block| payload_size(block) >= size).and_then(NonNull::new)
}

fn best_fit(
  blocks: impl Iterator<Item = *mut Block>,
  size: usize,
) -> Option<NonNull<Block>> {
  let mut best = None;
  let mut best_size = usize::MAX;

  for block in blocks {
    let candidate = payload_size(block);

    if candidate >= size && candidate < best_size {
      best = Some(block);
      best_size = candidate;

      if candidate == size {
        break;
      }
    }
  }

  best.and_then(NonNull::new)
}

fn worst_fit(
  blocks: impl Iterator<Item = *mut Block>,
  size: usize,
) -> Option<NonNull<Block>> {
  let mut worst = None;
  let mut worst_size = 0;

  for block in blocks {
    let candidate = payload_size(block);

    if candidate >= size && (worst.is_none() || candidate > worst_size) {
      worst = Some(block);
      worst_size = candidate;
    }
  }

  worst.and_then(NonNull::new)
}

fn segregated(
  index: &FreeIndex,
  size: usize,
) -> Option<NonNull<Block>> {
  // Small bins hold a single size and large bins are sorted, so the first fit
  // found walking upward is also the smallest sufficient block.
  (index.bin_of(size)..BIN_COUNT).find_map(|bin| first_fit(index.bin(bin), size))
}

fn quick_fit(
  index: &FreeIndex,
  size: usize,
) -> Option<NonNull<Block>> {
  let slot = quick_slot(size);

  if let Some(block) = slot.and_then(|slot| NonNull::new(index.head(slot))) {
    return Some(block);
  }

  if let Some(block) = first_fit(index.bin(GENERAL_BIN), size) {
    return Some(block);
  }

  // Every block in a higher quick list is larger than a hot request.
  let above = slot? + 1;
  (above..=QUICK_SIZE_COUNT).find_map(|slot| NonNull::new(index.head(slot)))
}
