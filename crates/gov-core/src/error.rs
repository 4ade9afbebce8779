use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy surfaced by commit-stage failures. Guard-stage
/// rejections never construct these directly — they return [`Rejection`]
/// values instead; `GovError::Rejected` is the bridge used by `execute()`.
#[derive(Debug, Error)]
pub enum GovError {
  // ── Identity / authority errors ──────────────────────────────────────────
  #[error("signature invalid for initiator {initiator}")]
  SignatureInvalid { initiator: String },

  #[error("entity revoked: {0}")]
  RevokedEntity(String),

  #[error("initiator not authorized for {capacity} over {jurisdiction}")]
  OverscopeAttempt {
    capacity: String,
    jurisdiction: String,
  },

  // ── Resource / invariant errors ──────────────────────────────────────────
  #[error("metric value is not finite: {0}")]
  NonFiniteMetric(String),

  #[error("temporal paradox: {0}")]
  TemporalParadox(String),

  #[error("payload exceeds {max} bytes ({got} bytes)")]
  PayloadOversize { max: usize, got: usize },

  #[error("invalid id format: {0}")]
  InvalidIdFormat(String),

  #[error("payload is missing metric id")]
  MissingMetricId,

  // ── Pipeline errors ───────────────────────────────────────────────────────
  #[error("action already seen: {0}")]
  ReplayDetected(String),

  #[error("irreversible action requires {need} approvals, got {got}")]
  IrreversibilityViolation { need: usize, got: usize },

  #[error("protocol violation: {0}")]
  ProtocolViolation(String),

  #[error("budget exhausted: need {need}, have {have}")]
  BudgetExhausted { need: u64, have: u64 },

  #[error("data integrity violation: {0}")]
  DataIntegrity(String),

  #[error("lifecycle violation: operation not permitted in state {0}")]
  LifecycleViolation(String),

  // ── Guard rejection bridge ────────────────────────────────────────────────
  #[error("rejected: {0}")]
  Rejected(#[from] Rejection),

  // ── Infrastructure ────────────────────────────────────────────────────────
  #[error("serialization error: {0}")]
  Serialization(String),

  #[error("storage error: {0}")]
  Storage(String),

  #[error("replay mismatch: {0}")]
  ReplayMismatch(String),

  #[error("{0}")]
  Other(String),
}

/// Structured rejection object — the principal user-facing error contract
/// for guard-stage failures. Never thrown; always returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
  pub code: RejectionCode,
  /// Invariant id (`INV-ID-01`, …) when the rejection came from the
  /// invariant battery, or the guard's name otherwise.
  pub invariant_id: String,
  /// Human-readable constitutional boundary this rejection enforces.
  pub boundary: String,
  /// Whether this action could succeed if resubmitted unchanged, as
  /// opposed to being rejected on its merits. Almost always `false`;
  /// `true` marks transient conditions (e.g. a cooldown window) where
  /// retrying later without modification could pass.
  pub permissible: bool,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}

impl Rejection {
  pub fn new(
    code: RejectionCode,
    invariant_id: impl Into<String>,
    boundary: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    Self {
      code,
      invariant_id: invariant_id.into(),
      boundary: boundary.into(),
      permissible: false,
      message: message.into(),
      details: None,
    }
  }

  pub fn with_details(mut self, details: serde_json::Value) -> Self {
    self.details = Some(details);
    self
  }
}

impl std::fmt::Display for Rejection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?} ({}): {}", self.code, self.invariant_id, self.message)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionCode {
  SignatureInvalid,
  RevokedEntity,
  OverscopeAttempt,
  NonFiniteMetric,
  TemporalParadox,
  PayloadOversize,
  InvalidIdFormat,
  MissingMetricId,
  ReplayDetected,
  IrreversibilityViolation,
  ProtocolViolation,
  BudgetExhausted,
  DataIntegrity,
  LifecycleViolation,
}
