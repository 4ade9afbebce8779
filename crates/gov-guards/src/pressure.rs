use std::collections::HashMap;

use gov_core::constants::DEFAULT_PRESSURE_THRESHOLD;
use tracing::warn;

/// Per-invariant-id rejection counters. Logging-only
/// diagnostics; pressure never alters admission decisions.
#[derive(Debug, Default)]
pub struct PressureCounters {
  counts: HashMap<String, u32>,
  threshold: u32,
}

impl PressureCounters {
  pub fn new() -> Self {
    Self { counts: HashMap::new(), threshold: DEFAULT_PRESSURE_THRESHOLD }
  }

  pub fn with_threshold(threshold: u32) -> Self {
    Self { counts: HashMap::new(), threshold }
  }

  pub fn record(&mut self, invariant_id: &str) {
    let count = self.counts.entry(invariant_id.to_string()).or_insert(0);
    *count += 1;
    if *count >= self.threshold {
      warn!(invariant_id, count = *count, "pressure threshold exceeded");
    }
  }

  pub fn count(&self, invariant_id: &str) -> u32 {
    self.counts.get(invariant_id).copied().unwrap_or(0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts_accumulate_per_invariant() {
    let mut p = PressureCounters::with_threshold(3);
    p.record("INV-ID-01");
    p.record("INV-ID-01");
    p.record("INV-RES-01");
    assert_eq!(p.count("INV-ID-01"), 2);
    assert_eq!(p.count("INV-RES-01"), 1);
  }
}
