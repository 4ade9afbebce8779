use gov_core::types::{LogicalTimestamp, Metric, MetricId};
use serde::{Deserialize, Serialize};

/// Per-metric stored value. `state_hash` is a hash chain:
/// `H(prevStateHash ‖ evidenceId)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateValue {
  pub value: serde_json::Value,
  pub updated_at: LogicalTimestamp,
  pub evidence_hash: String,
  pub state_hash: String,
}

/// A named validator applied to incoming metric values. Kept as a closed set
/// of well-known kinds rather than arbitrary code — a validator is a
/// reference to one of these, never an executable payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidatorKind {
  NonNegative,
  Boolean,
  FiniteNumber,
}

impl ValidatorKind {
  pub fn check(&self, value: &serde_json::Value) -> bool {
    match self {
      ValidatorKind::NonNegative => value.as_f64().is_some_and(|v| v >= 0.0),
      ValidatorKind::Boolean => value.is_boolean(),
      ValidatorKind::FiniteNumber => value.as_f64().is_some_and(f64::is_finite),
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "NON_NEGATIVE" => Some(Self::NonNegative),
      "BOOLEAN" => Some(Self::Boolean),
      "FINITE_NUMBER" => Some(Self::FiniteNumber),
      _ => None,
    }
  }
}

/// The metric registry: static descriptions of every `MetricId` the kernel
/// will accept mutations for.
#[derive(Debug, Default)]
pub struct MetricRegistry {
  metrics: std::collections::HashMap<MetricId, Metric>,
}

impl MetricRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, metric: Metric) {
    self.metrics.insert(metric.id.clone(), metric);
  }

  pub fn get(&self, id: &MetricId) -> Option<&Metric> {
    self.metrics.get(id)
  }

  pub fn is_registered(&self, id: &MetricId) -> bool {
    self.metrics.contains_key(id)
  }
}
