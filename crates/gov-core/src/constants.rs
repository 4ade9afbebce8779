//! ─── Governance Kernel Constants ────────────────────────────────────────────

// ── Guard thresholds ─────────────────────────────────────────────────────────

/// Clock-skew tolerance for INV-RES-02: an action timestamp more than this
/// many milliseconds ahead of "now" is rejected as a temporal paradox.
pub const CLOCK_SKEW_TOLERANCE_MS: i64 = 60_000;

/// INV-RES-03: maximum canonical-encoded payload size.
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024;

/// IrreversibilityGuard: minimum distinct approvals required for an
/// `irreversible = true` action.
pub const MIN_IRREVERSIBLE_APPROVALS: usize = 2;

/// MultiSigGuard (override path): minimum distinct valid signatures.
pub const MIN_OVERRIDE_SIGNATURES: usize = 3;

/// Pressure instrumentation: rejection count per invariant id before a
/// pressure event is logged. Logging-only; never alters admission.
pub const DEFAULT_PRESSURE_THRESHOLD: u32 = 5;

/// Ratification cooldown: logical milliseconds a protocol must sit in
/// PROPOSED before it can be RATIFIED (outside sentinel signatures).
pub const RATIFICATION_COOLDOWN_MS: i64 = 24 * 3_600 * 1_000;

// ── Reserved metric ids ──────────────────────────────────────────────────────

pub const RESERVED_METRIC_IDS: &[&str] = &["__proto__", "prototype", "constructor"];

// ── Sentinel signatures ──────────────────────────────────────────────────────

/// Bypasses cryptographic verification for kernel-internal system actions.
/// Use is restricted by the caller, not by the guards.
pub const SENTINEL_TRUSTED: &str = "TRUSTED";

/// Bypasses cryptographic verification for governance-internal actions
/// (e.g. delegation grants signed on behalf of the root authority).
pub const SENTINEL_GOVERNANCE: &str = "GOVERNANCE_SIGNATURE";

pub fn is_sentinel_signature(sig: &str) -> bool {
    sig == SENTINEL_TRUSTED || sig == SENTINEL_GOVERNANCE
}

// ── Well-known capacities ────────────────────────────────────────────────────

pub const CAPACITY_GOVERNANCE_OVERRIDE: &str = "GOVERNANCE:OVERRIDE";
pub const CAPACITY_GOVERNANCE_WILDCARD: &str = "GOVERNANCE:*";
pub const CAPACITY_METRIC_WRITE_PREFIX: &str = "METRIC.WRITE";

// ── Protocol ids exempt from ProtocolBindingGuard ────────────────────────────

pub const PROTOCOL_ID_SYSTEM: &str = "SYSTEM";
pub const PROTOCOL_ID_ROOT: &str = "ROOT";

pub const PROTOCOL_ID_REGISTER: &str = "REGISTER";
