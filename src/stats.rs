use std::fmt;

/// Snapshot of a heap, taken by walking every region block by block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub regions: usize,
  pub region_bytes: usize,
  pub allocated_blocks: usize,
  pub allocated_bytes: usize,
  pub free_blocks: usize,
  pub free_bytes: usize,
  /// Headers, footers, region headers and fences.
  pub overhead_bytes: usize,
  pub largest_free: usize,
}

impl HeapStats {
  /// Share of acquired bytes handed out as payload.
  pub fn utilization(&self) -> f64 {
    if self.region_bytes == 0 {
      return 0.0;
    }

    self.allocated_bytes as f64 / self.region_bytes as f64
  }

  /// Every acquired byte is payload (live or free) or metadata.
  pub fn is_conserved(&self) -> bool {
    self.allocated_bytes + self.free_bytes + self.overhead_bytes == self.region_bytes
  }
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "{} regions / {} bytes: {} allocated ({} bytes), ",
      self.regions, self.region_bytes, self.allocated_blocks, self.allocated_bytes
    )?;
    write!(
      f,
      "{} free ({} bytes, largest {}), {} overhead bytes, {:.1}% utilization",
      self.free_blocks,
      self.free_bytes,
      self.largest_free,
      self.overhead_bytes,
      self.utilization() * 100.0
    )
  }
}
