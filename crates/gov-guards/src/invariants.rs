use gov_core::canon::canonical_bytes;
use gov_core::constants::{is_sentinel_signature, CLOCK_SKEW_TOLERANCE_MS, MAX_PAYLOAD_BYTES, PROTOCOL_ID_REGISTER};
use gov_core::error::{Rejection, RejectionCode};
use gov_core::types::Action;
use gov_identity::IdentityRegistry;

fn reject(code: RejectionCode, invariant_id: &str, boundary: &str, message: impl Into<String>) -> Rejection {
    Rejection::new(code, invariant_id, boundary, message)
}

/// INV-ID-01: signature is either a sentinel or a well-formed hex string.
pub fn check_signature_format(action: &Action) -> Result<(), Rejection> {
    let sig = &action.signature;
    if is_sentinel_signature(sig) || hex::decode(sig).is_ok() {
        Ok(())
    } else {
        Err(reject(
            RejectionCode::SignatureInvalid,
            "INV-ID-01",
            "signature must be a sentinel or hex string",
            format!("malformed signature for action {}", action.action_id),
        ))
    }
}

/// INV-ID-02: initiator is registered, unless this is a REGISTER action.
pub fn check_initiator_registered(action: &Action, registry: &IdentityRegistry) -> Result<(), Rejection> {
    let is_register = action.payload.protocol_id.as_ref().map(|p| p.as_str()) == Some(PROTOCOL_ID_REGISTER);
    if is_register || registry.is_registered(&action.initiator) {
        Ok(())
    } else {
        Err(reject(
            RejectionCode::RevokedEntity,
            "INV-ID-02",
            "initiator must be registered",
            format!("unknown initiator {}", action.initiator),
        ))
    }
}

/// INV-ID-03: initiator status is ACTIVE (skipped for REGISTER actions,
/// which by definition precede registration).
pub fn check_initiator_active(action: &Action, registry: &IdentityRegistry) -> Result<(), Rejection> {
    let is_register = action.payload.protocol_id.as_ref().map(|p| p.as_str()) == Some(PROTOCOL_ID_REGISTER);
    if is_register {
        return Ok(());
    }
    if registry.is_active(&action.initiator) {
        Ok(())
    } else {
        Err(reject(
            RejectionCode::RevokedEntity,
            "INV-ID-03",
            "initiator must be ACTIVE",
            format!("initiator {} is not active", action.initiator),
        ))
    }
}

/// INV-RES-01: numeric payload values are finite.
pub fn check_finite_value(action: &Action) -> Result<(), Rejection> {
    if let Some(n) = action.payload.value.as_f64() {
        if !n.is_finite() {
            return Err(reject(
                RejectionCode::NonFiniteMetric,
                "INV-RES-01",
                "metric values must be finite",
                format!("non-finite value for metric {}", action.payload.metric_id),
            ));
        }
    }
    Ok(())
}

/// INV-RES-02: timestamp does not exceed now + the clock-skew tolerance.
/// Logical ordering uses `LogicalTimestamp` everywhere else; this invariant
/// is the sole place wall-clock time enters the kernel, and it reads the
/// timestamp's `epoch` field as milliseconds since the Unix epoch.
pub fn check_clock_skew(action: &Action, now_ms: i64) -> Result<(), Rejection> {
    let action_wall_ms = action.timestamp.epoch as i64;
    if action_wall_ms > now_ms + CLOCK_SKEW_TOLERANCE_MS {
        Err(reject(
            RejectionCode::TemporalParadox,
            "INV-RES-02",
            "timestamp must not exceed now + 60s",
            format!("action {} timestamp is too far in the future", action.action_id),
        ))
    } else {
        Ok(())
    }
}

/// INV-RES-03: canonical payload encoding fits within the size budget.
pub fn check_payload_size(action: &Action) -> Result<(), Rejection> {
    let bytes = canonical_bytes(&action.payload).len();
    if bytes > MAX_PAYLOAD_BYTES {
        Err(reject(
            RejectionCode::PayloadOversize,
            "INV-RES-03",
            "canonical payload must be <= 16KiB",
            format!("payload is {bytes} bytes"),
        ))
    } else {
        Ok(())
    }
}

/// INV-PRO-01: actionId is non-empty.
pub fn check_action_id_present(action: &Action) -> Result<(), Rejection> {
    if action.action_id.as_str().is_empty() {
        Err(reject(
            RejectionCode::InvalidIdFormat,
            "INV-PRO-01",
            "actionId must be non-empty",
            "empty actionId",
        ))
    } else {
        Ok(())
    }
}

/// INV-PRO-02: payload carries a metricId.
pub fn check_metric_id_present(action: &Action) -> Result<(), Rejection> {
    if action.payload.metric_id.as_str().is_empty() {
        Err(reject(
            RejectionCode::MissingMetricId,
            "INV-PRO-02",
            "payload must carry metricId",
            "missing metricId",
        ))
    } else {
        Ok(())
    }
}
