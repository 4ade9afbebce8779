use serde::{Deserialize, Serialize};

/// A protocol execution rule, producing one metric mutation when its
/// protocol fires during commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rule {
  MutateMetric { metric_id: String, delta: f64 },
}

impl Rule {
  pub fn target_metric(&self) -> &str {
    match self {
      Rule::MutateMetric { metric_id, .. } => metric_id,
    }
  }

  /// Apply this rule against `current` (the metric's present numeric
  /// value, or 0.0 if absent) and return the resulting value.
  pub fn resulting_value(&self, current: f64) -> f64 {
    match self {
      Rule::MutateMetric { delta, .. } => current + delta,
    }
  }
}
