//! # fitalloc - A Free-List Memory Allocator Library
//!
//! This crate provides a general-purpose **free-list heap** for user space: it
//! carves regions obtained from the kernel (`mmap`) into blocks, hands them
//! out, and recycles them when they are freed.
//!
//! ## Overview
//!
//! ```text
//!   Heap:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │  Free-space index                                                    │
//!   │  ┌─────┬─────┬─────┬─────┐                                           │
//!   │  │ bin │ bin │ ... │ bin │ ──► free blocks, linked through headers   │
//!   │  └─────┴─────┴─────┴─────┘                                           │
//!   │                                                                      │
//!   │  Region ──► Region ──► Region          (acquired with mmap, kept)    │
//!   │  ┌───┬────┬────────┬────┬───────────────┬───┐                        │
//!   │  │ ▌ │ A1 │  free  │ A2 │     free      │ ▐ │   ▌ ▐ region fences    │
//!   │  └───┴────┴────────┴────┴───────────────┴───┘                        │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `allocate` asks the placement policy for a free block, splits off whatever
//! the request does not need and returns the payload. When nothing fits, the
//! heap grows by one region and retries once. `free` merges the block with
//! free physical neighbours and files the result back into the index.
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── block      - Block header / boundary tag layout
//!   ├── region     - Region layout, fences, growth sizing
//!   ├── index      - Free-space index (bins)
//!   ├── placement  - First/best/worst/segregated/quick fit
//!   ├── split      - Splitting oversized blocks
//!   ├── coalesce   - Merging free neighbours
//!   ├── heap       - Heap: allocate, free, stats, validate
//!   ├── locked     - LockedHeap (GlobalAlloc behind a spin lock)
//!   └── source     - MemorySource trait, MmapSource
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitalloc::{Heap, HeapConfig, MmapSource, Policy};
//!
//! let mut heap = Heap::new(MmapSource::new(), HeapConfig::new().with_policy(Policy::BestFit));
//!
//! let ptr = heap.allocate(24).unwrap();
//!
//! unsafe {
//!   ptr.as_ptr().write_bytes(0x2A, 24);
//!   heap.free(ptr);
//! }
//!
//! assert!(heap.stats().is_conserved());
//! ```
//!
//! ## How It Works
//!
//! Each block carries a header before its payload and a footer after it:
//!
//! ```text
//!   Single Allocation:
//!   ┌───────────────────────┬────────────────────────────────┬──────────────┐
//!   │    Block Header       │         User Data              │ Footer       │
//!   │  ┌─────────────────┐  │                                │ ┌──────────┐ │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │ │ size: N  │ │
//!   │  │ state           │  │  │                          │  │ │ state    │ │
//!   │  │ next / prev     │  │  │     N bytes usable       │  │ └──────────┘ │
//!   │  └─────────────────┘  │  │                          │  │              │
//!   │      4 words          │  └──────────────────────────┘  │   2 words    │
//!   └───────────────────────┴────────────────────────────────┴──────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! The footer lets `free` find the block below in O(1); the header of the
//! block above sits right after the footer. Fences at both ends of a region
//! look like allocated blocks, so merging stops at region boundaries.
//!
//! ## Features
//!
//! - **Five placement policies**: first, best and worst fit over one list,
//!   segregated size-class bins, and quick fit for hot sizes
//! - **Splitting** of oversized blocks and **coalescing** with left and/or
//!   right neighbours
//! - **Statistics and validation** by walking every region
//! - **`GlobalAlloc`** through [`LockedHeap`]
//!
//! ## Limitations
//!
//! - **Single-threaded core**: [`Heap`] has no locking of its own
//! - **Grow only**: regions are never returned to the OS
//! - **Alignment**: payloads are aligned to [`align::ALIGNMENT`] and no more
//! - **Unix-only**: [`MmapSource`] requires `libc` and `mmap`
//!
//! ## Safety
//!
//! Freeing a pointer that did not come from the same heap, or freeing it
//! twice, corrupts the heap. Debug builds assert against it; release builds
//! do not check.

pub mod align;
mod block;
mod coalesce;
mod config;
mod error;
mod heap;
mod index;
mod locked;
mod placement;
mod region;
mod source;
mod split;
mod stats;

#[cfg(test)]
mod testing;

pub use block::{BLOCK_OVERHEAD, MIN_PAYLOAD};
pub use coalesce::Coalescing;
pub use config::HeapConfig;
pub use error::{AllocError, HeapError};
pub use heap::Heap;
pub use locked::LockedHeap;
pub use placement::Policy;
pub use region::REGION_OVERHEAD;
pub use source::{MemorySource, MmapSource};
pub use stats::HeapStats;
