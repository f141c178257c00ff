use std::mem;

/// Granularity of every payload size and payload address handed out by the heap.
///
/// Two machine words, so headers, footers and payloads all stay aligned for
/// `u128`-sized values.
pub const ALIGNMENT: usize = 2 * mem::size_of::<usize>();

/// Rounds `value` up to the heap alignment unit.
///
/// # Examples
///
/// ```rust
/// use fitalloc::align;
/// use fitalloc::align::ALIGNMENT;
///
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(1), ALIGNMENT);
/// assert_eq!(align!(ALIGNMENT), ALIGNMENT);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::align::ALIGNMENT)
  };
}

/// Rounds `value` up to `align`, which must be a power of two.
///
/// ```rust
/// use fitalloc::align_to;
///
/// assert_eq!(align_to!(4097, 4096), 8192);
/// assert_eq!(align_to!(4096, 4096), 4096);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Overflow-checked [`align_to!`] for sizes coming from callers.
pub fn checked_align_to(
  value: usize,
  align: usize,
) -> Option<usize> {
  debug_assert!(align.is_power_of_two());
  value.checked_add(align - 1).map(|v| v & !(align - 1))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (ALIGNMENT * i + 1)..=(ALIGNMENT * (i + 1));

      let expected_alignment = ALIGNMENT * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
      }
    }
  }

  #[test]
  fn test_checked_align_overflow() {
    assert_eq!(checked_align_to(usize::MAX, ALIGNMENT), None);
    assert_eq!(checked_align_to(ALIGNMENT + 1, ALIGNMENT), Some(2 * ALIGNMENT));
    assert_eq!(checked_align_to(0, ALIGNMENT), Some(0));
  }
}
