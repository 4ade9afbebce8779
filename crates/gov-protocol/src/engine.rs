use std::collections::HashMap;

use gov_core::constants::{is_sentinel_signature, RATIFICATION_COOLDOWN_MS};
use gov_core::types::{LogicalTimestamp, MetricId, MetricMutation, ProtocolId};
use gov_state::StateEngine;
use thiserror::Error;
use tracing::info;

use crate::protocol::{Lifecycle, Protocol};

#[derive(Debug, Error)]
pub enum ProtocolError {
  #[error("protocol not found: {0}")]
  NotFound(String),
  #[error("protocol {0} is not in PROPOSED")]
  NotProposed(String),
  #[error("ratification cooldown not elapsed for {0}")]
  CooldownNotElapsed(String),
  #[error("protocol conflict: protocols {first} and {second} both target metric {metric_id}")]
  Conflict { first: String, second: String, metric_id: String },
}

/// Registered protocols keyed by id, with lifecycle transitions and
/// commit-time evaluation.
#[derive(Debug, Default)]
pub struct ProtocolEngine {
  protocols: HashMap<ProtocolId, Protocol>,
}

impl ProtocolEngine {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, protocol: Protocol) {
    info!(protocol = %protocol.id, "protocol proposed");
    self.protocols.insert(protocol.id.clone(), protocol);
  }

  pub fn get(&self, id: &ProtocolId) -> Option<&Protocol> {
    self.protocols.get(id)
  }

  pub fn is_active(&self, id: &ProtocolId) -> bool {
    self.protocols.get(id).is_some_and(|p| p.is_active())
  }

  /// `PROPOSED -> RATIFIED`. Requires the 24h logical cooldown to have
  /// elapsed unless `signature` is a governance sentinel.
  pub fn ratify(&mut self, id: &ProtocolId, now: LogicalTimestamp, signature: &str) -> Result<(), ProtocolError> {
    let protocol = self.protocols.get_mut(id).ok_or_else(|| ProtocolError::NotFound(id.to_string()))?;
    if protocol.lifecycle != Lifecycle::Proposed {
      return Err(ProtocolError::NotProposed(id.to_string()));
    }
    if !is_sentinel_signature(signature) {
      let elapsed_ms = now.epoch as i64 - protocol.proposed_at.epoch as i64;
      if elapsed_ms < RATIFICATION_COOLDOWN_MS {
        return Err(ProtocolError::CooldownNotElapsed(id.to_string()));
      }
    }
    protocol.lifecycle = Lifecycle::Ratified;
    info!(protocol = %id, "protocol ratified");
    Ok(())
  }

  pub fn activate(&mut self, id: &ProtocolId) -> Result<(), ProtocolError> {
    let protocol = self.protocols.get_mut(id).ok_or_else(|| ProtocolError::NotFound(id.to_string()))?;
    protocol.lifecycle = Lifecycle::Active;
    info!(protocol = %id, "protocol activated");
    Ok(())
  }

  pub fn deprecate(&mut self, id: &ProtocolId) -> Result<(), ProtocolError> {
    let protocol = self.protocols.get_mut(id).ok_or_else(|| ProtocolError::NotFound(id.to_string()))?;
    protocol.lifecycle = Lifecycle::Deprecated;
    Ok(())
  }

  /// `REVOKED` is reachable from any state.
  pub fn revoke(&mut self, id: &ProtocolId) -> Result<(), ProtocolError> {
    let protocol = self.protocols.get_mut(id).ok_or_else(|| ProtocolError::NotFound(id.to_string()))?;
    protocol.lifecycle = Lifecycle::Revoked;
    Ok(())
  }

  /// Evaluate every ACTIVE protocol's preconditions against `state`
  /// overlaid with `proposed_mutation`, collect the mutations produced by
  /// triggered protocols, and detect conflicts (two triggered protocols
  /// targeting the same metric aborts the whole evaluation).
  pub fn evaluate(
    &self,
    state: &StateEngine,
    proposed_mutation: &MetricMutation,
  ) -> Result<Vec<MetricMutation>, ProtocolError> {
    let current = state.current_state();
    let lookup = |metric_id: &str| -> Option<f64> {
      if metric_id == proposed_mutation.metric_id.as_str() {
        return proposed_mutation.value.as_f64();
      }
      current.metrics.get(&MetricId::from(metric_id)).and_then(|v| v.value.as_f64())
    };

    let mut collected: Vec<(ProtocolId, MetricMutation)> = Vec::new();
    for protocol in self.protocols.values().filter(|p| p.is_active()) {
      let triggered = protocol.preconditions.iter().all(|pred| pred.evaluate(&lookup));
      if !triggered {
        continue;
      }
      for rule in &protocol.execution {
        let target = MetricId::from(rule.target_metric());
        let current_value = lookup(rule.target_metric()).unwrap_or(0.0);
        let new_value = rule.resulting_value(current_value);
        collected.push((protocol.id.clone(), MetricMutation { metric_id: target, value: serde_json::json!(new_value) }));
      }
    }

    let mut by_metric: HashMap<MetricId, ProtocolId> = HashMap::new();
    for (protocol_id, mutation) in &collected {
      if let Some(existing) = by_metric.get(&mutation.metric_id) {
        return Err(ProtocolError::Conflict {
          first: existing.to_string(),
          second: protocol_id.to_string(),
          metric_id: mutation.metric_id.to_string(),
        });
      }
      by_metric.insert(mutation.metric_id.clone(), protocol_id.clone());
    }

    Ok(collected.into_iter().map(|(_, m)| m).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::predicate::{Predicate, ThresholdOp};
  use crate::rule::Rule;

  fn ts(n: u64) -> LogicalTimestamp {
    LogicalTimestamp::new(n, 0)
  }

  #[test]
  fn triggered_protocol_produces_mutation() {
    let mut engine = ProtocolEngine::new();
    let mut p = Protocol::proposed(
      ProtocolId::from("p1"),
      vec![Predicate::MetricThreshold { metric_id: "metric.a".into(), op: ThresholdOp::Ge, value: 0.0 }],
      vec![Rule::MutateMetric { metric_id: "metric.b".into(), delta: 5.0 }],
      ts(0),
    );
    p.lifecycle = Lifecycle::Active;
    engine.register(p);

    let state = StateEngine::new();
    let proposed = MetricMutation { metric_id: MetricId::from("metric.a"), value: serde_json::json!(20) };
    let mutations = engine.evaluate(&state, &proposed).unwrap();
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].metric_id, MetricId::from("metric.b"));
    assert_eq!(mutations[0].value, serde_json::json!(5.0));
  }

  #[test]
  fn conflicting_protocols_abort_evaluation() {
    let mut engine = ProtocolEngine::new();
    let mut p1 = Protocol::proposed(
      ProtocolId::from("p1"),
      vec![Predicate::Always],
      vec![Rule::MutateMetric { metric_id: "metric.x".into(), delta: 1.0 }],
      ts(0),
    );
    p1.lifecycle = Lifecycle::Active;
    let mut p2 = Protocol::proposed(
      ProtocolId::from("p2"),
      vec![Predicate::Always],
      vec![Rule::MutateMetric { metric_id: "metric.x".into(), delta: 2.0 }],
      ts(0),
    );
    p2.lifecycle = Lifecycle::Active;
    engine.register(p1);
    engine.register(p2);

    let state = StateEngine::new();
    let proposed = MetricMutation { metric_id: MetricId::from("metric.a"), value: serde_json::json!(20) };
    let err = engine.evaluate(&state, &proposed).unwrap_err();
    assert!(matches!(err, ProtocolError::Conflict { .. }));
  }

  #[test]
  fn cooldown_blocks_non_sentinel_ratification() {
    let mut engine = ProtocolEngine::new();
    engine.register(Protocol::proposed(ProtocolId::from("p1"), vec![], vec![], ts(0)));
    let err = engine.ratify(&ProtocolId::from("p1"), ts(1000), "not-sentinel").unwrap_err();
    assert!(matches!(err, ProtocolError::CooldownNotElapsed(_)));
    engine.ratify(&ProtocolId::from("p1"), ts(1000), "GOVERNANCE_SIGNATURE").unwrap();
  }
}
