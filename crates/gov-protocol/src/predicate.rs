use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThresholdOp {
  Gt,
  Ge,
  Lt,
  Le,
  Eq,
}

impl ThresholdOp {
  pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
    match self {
      ThresholdOp::Gt => lhs > rhs,
      ThresholdOp::Ge => lhs >= rhs,
      ThresholdOp::Lt => lhs < rhs,
      ThresholdOp::Le => lhs <= rhs,
      ThresholdOp::Eq => (lhs - rhs).abs() < f64::EPSILON,
    }
  }
}

/// A protocol precondition, evaluated against the current state overlaid
/// with the proposed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
  MetricThreshold { metric_id: String, op: ThresholdOp, value: f64 },
  Always,
}

impl Predicate {
  /// `lookup` resolves a metric id to its current numeric value (after
  /// overlaying the proposed mutation); missing metrics evaluate any
  /// threshold predicate that names them to `false`.
  pub fn evaluate<F: Fn(&str) -> Option<f64>>(&self, lookup: F) -> bool {
    match self {
      Predicate::Always => true,
      Predicate::MetricThreshold { metric_id, op, value } => {
        lookup(metric_id).is_some_and(|current| op.apply(current, *value))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn threshold_matches_overlaid_value() {
    let p = Predicate::MetricThreshold { metric_id: "a".into(), op: ThresholdOp::Ge, value: 0.0 };
    assert!(p.evaluate(|id| if id == "a" { Some(20.0) } else { None }));
    assert!(!p.evaluate(|id| if id == "a" { Some(-1.0) } else { None }));
  }

  #[test]
  fn always_is_always_true() {
    assert!(Predicate::Always.evaluate(|_| None));
  }

  #[test]
  fn missing_metric_fails_threshold() {
    let p = Predicate::MetricThreshold { metric_id: "missing".into(), op: ThresholdOp::Eq, value: 1.0 };
    assert!(!p.evaluate(|_| None));
  }
}
