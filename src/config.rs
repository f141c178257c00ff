use crate::{coalesce::Coalescing, placement::Policy};

/// Region size used when a request fits comfortably in one page.
pub const DEFAULT_MIN_REGION_SIZE: usize = 4096;

/// Extra bytes added on top of a large request when sizing its region.
pub const DEFAULT_LARGE_REGION_SLACK: usize = 1024;

/// Tunables of a [`Heap`](crate::Heap).
///
/// ```rust
/// use fitalloc::{Coalescing, HeapConfig, Policy};
///
/// let config = HeapConfig::new()
///   .with_policy(Policy::BestFit)
///   .with_coalescing(Coalescing::Left)
///   .with_max_heap_bytes(1 << 20);
///
/// assert_eq!(config.policy, Policy::BestFit);
/// assert_eq!(config.max_heap_bytes, Some(1 << 20));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
  pub policy: Policy,
  pub coalescing: Coalescing,
  /// Smallest region requested from the memory source.
  pub min_region_size: usize,
  /// Headroom added to requests too large for `min_region_size`.
  pub large_region_slack: usize,
  /// Upper bound on the total bytes of all acquired regions.
  pub max_heap_bytes: Option<usize>,
  /// Whether the heap itself emits `log` records on growth, split, release
  /// and finalize.
  pub logging: bool,
}

impl HeapConfig {
  pub const fn new() -> Self {
    Self {
      policy: Policy::Segregated,
      coalescing: Coalescing::Both,
      min_region_size: DEFAULT_MIN_REGION_SIZE,
      large_region_slack: DEFAULT_LARGE_REGION_SLACK,
      max_heap_bytes: None,
      logging: true,
    }
  }

  pub const fn with_policy(
    mut self,
    policy: Policy,
  ) -> Self {
    self.policy = policy;
    self
  }

  pub const fn with_coalescing(
    mut self,
    coalescing: Coalescing,
  ) -> Self {
    self.coalescing = coalescing;
    self
  }

  pub const fn with_min_region_size(
    mut self,
    size: usize,
  ) -> Self {
    self.min_region_size = size;
    self
  }

  pub const fn with_large_region_slack(
    mut self,
    slack: usize,
  ) -> Self {
    self.large_region_slack = slack;
    self
  }

  pub const fn with_max_heap_bytes(
    mut self,
    limit: usize,
  ) -> Self {
    self.max_heap_bytes = Some(limit);
    self
  }

  pub const fn with_logging(
    mut self,
    logging: bool,
  ) -> Self {
    self.logging = logging;
    self
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::new()
  }
}
