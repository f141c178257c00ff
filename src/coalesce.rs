use crate::{
  block::{BLOCK_OVERHEAD, Block, BlockState},
  index::FreeIndex,
};

/// Which physical neighbours a released block is merged with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Coalescing {
  /// Released blocks go back to the index as they are.
  Disabled,
  /// Merge with a free block immediately below.
  Left,
  /// Merge with a free block immediately above.
  Right,
  #[default]
  Both,
}

impl Coalescing {
  pub fn merges_left(self) -> bool {
    matches!(self, Coalescing::Left | Coalescing::Both)
  }

  pub fn merges_right(self) -> bool {
    matches!(self, Coalescing::Right | Coalescing::Both)
  }
}

/// Returns a released block to `index`, absorbing free physical neighbours first.
///
/// Neighbours are found through the boundary tags: the footer just below the
/// header and the header just past the footer. At the edges of a region those
/// are the region's fences, which are never free, so the walk stops there.
/// Absorbed neighbours are unlinked before the survivor is inserted. Returns
/// the surviving block, which is `block` itself unless a left merge happened.
///
/// # Safety
///
/// `block` must be an allocated block of this heap, not linked into `index`.
pub unsafe fn coalesce(
  index: &mut FreeIndex,
  block: *mut Block,
  mode: Coalescing,
) -> *mut Block {
  unsafe {
    debug_assert!(!Block::is_free(block));

    let mut survivor = block;
    let mut size = (*block).size;

    if mode.merges_right() {
      let right = Block::right(block);

      if Block::is_free(right) {
        index.remove(right);
        size += BLOCK_OVERHEAD + (*right).size;
      }
    }

    if mode.merges_left() && (*Block::preceding_footer(block)).state == BlockState::Free {
      let left = Block::left(block);

      index.remove(left);
      size += BLOCK_OVERHEAD + (*left).size;
      survivor = left;
    }

    Block::resize(survivor, size);
    index.insert(survivor);

    survivor
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{placement::Policy, testing::Arena};

  const SIZES: [usize; 5] = [16, 64, 96, 128, 16];

  /// Three blocks between two allocated guards standing in for region fences.
  unsafe fn setup(arena: &mut Arena<4096>) -> (FreeIndex, Vec<*mut Block>) {
    unsafe { (FreeIndex::new(Policy::FirstFit), arena.carve(&SIZES)) }
  }

  #[test]
  fn test_no_free_neighbours() {
    let mut arena = Arena::new();

    unsafe {
      let (mut index, blocks) = setup(&mut arena);

      let survivor = coalesce(&mut index, blocks[2], Coalescing::Both);

      assert_eq!(survivor, blocks[2]);
      assert_eq!((*survivor).size, SIZES[2]);
      assert_eq!(index.len(), 1);
    }
  }

  #[test]
  fn test_left_merge() {
    let mut arena = Arena::new();

    unsafe {
      let (mut index, blocks) = setup(&mut arena);

      coalesce(&mut index, blocks[1], Coalescing::Both);
      let survivor = coalesce(&mut index, blocks[2], Coalescing::Both);

      assert_eq!(survivor, blocks[1]);
      assert_eq!((*survivor).size, SIZES[1] + BLOCK_OVERHEAD + SIZES[2]);
      assert_eq!(Block::right(survivor), blocks[3]);
      assert_eq!(index.len(), 1);
    }
  }

  #[test]
  fn test_right_merge() {
    let mut arena = Arena::new();

    unsafe {
      let (mut index, blocks) = setup(&mut arena);

      coalesce(&mut index, blocks[3], Coalescing::Both);
      let survivor = coalesce(&mut index, blocks[2], Coalescing::Both);

      assert_eq!(survivor, blocks[2]);
      assert_eq!((*survivor).size, SIZES[2] + BLOCK_OVERHEAD + SIZES[3]);
      assert_eq!(Block::right(survivor), blocks[4]);
      assert_eq!(index.len(), 1);
    }
  }

  #[test]
  fn test_both_merge() {
    let mut arena = Arena::new();

    unsafe {
      let (mut index, blocks) = setup(&mut arena);

      coalesce(&mut index, blocks[1], Coalescing::Both);
      coalesce(&mut index, blocks[3], Coalescing::Both);
      assert_eq!(index.len(), 2);

      let survivor = coalesce(&mut index, blocks[2], Coalescing::Both);

      assert_eq!(survivor, blocks[1]);
      assert_eq!((*survivor).size, SIZES[1] + SIZES[2] + SIZES[3] + 2 * BLOCK_OVERHEAD);
      assert_eq!(Block::left(blocks[4]), survivor);
      assert_eq!(index.len(), 1);
      assert!(!Block::is_free(blocks[0]));
      assert!(!Block::is_free(blocks[4]));
    }
  }

  #[test]
  fn test_modes_restrict_direction() {
    for (mode, expected_len) in [
      (Coalescing::Disabled, 3),
      (Coalescing::Left, 2),
      (Coalescing::Right, 2),
    ] {
      let mut arena = Arena::new();

      unsafe {
        let (mut index, blocks) = setup(&mut arena);

        coalesce(&mut index, blocks[1], mode);
        coalesce(&mut index, blocks[3], mode);
        let survivor = coalesce(&mut index, blocks[2], mode);

        assert_eq!(index.len(), expected_len, "{:?}", mode);

        match mode {
          Coalescing::Left => assert_eq!(survivor, blocks[1]),
          _ => assert_eq!(survivor, blocks[2]),
        }
      }
    }
  }
}
