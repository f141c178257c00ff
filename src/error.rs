use thiserror::Error;

/// Why an allocation request could not be served.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  #[error("out of memory (requested {requested} bytes)")]
  OutOfMemory { requested: usize },

  #[error("memory source could not provide a region of {size} bytes")]
  SourceExhausted { size: usize },

  #[error("request of {size} bytes overflows the heap's size arithmetic")]
  RequestTooLarge { size: usize },
}

/// Inconsistency found by [`Heap::validate`](crate::Heap::validate).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
  #[error("block at {block:#x} has a footer that disagrees with its header")]
  FooterMismatch { block: usize },

  #[error("block walk of region at {region:#x} does not end at the region's end fence")]
  RegionOverrun { region: usize },

  #[error("free block at {block:#x} is missing from the free-space index")]
  UnindexedFreeBlock { block: usize },

  #[error("allocated block at {block:#x} is linked into the free-space index")]
  IndexedAllocatedBlock { block: usize },

  #[error("free block at {block:#x} of {size} bytes sits in bin {bin}, expected bin {expected}")]
  WrongBin {
    block: usize,
    size: usize,
    bin: usize,
    expected: usize,
  },

  #[error("index holds {indexed} free blocks but the regions contain {walked}")]
  FreeCountMismatch { indexed: usize, walked: usize },

  #[error("free blocks at {left:#x} and {right:#x} are adjacent but were not coalesced")]
  UncoalescedNeighbours { left: usize, right: usize },
}

pub type Result<T> = core::result::Result<T, AllocError>;
