use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Wall-clock Unix timestamp in milliseconds. Used only for the clock-skew
/// bound on `Action::timestamp`; all ordering in the system is by
/// `LogicalTimestamp`.
pub type WallClockMs = i64;

// ── LogicalTimestamp ─────────────────────────────────────────────────────────

/// `(epoch, logical)` pair with lexicographic order. The kernel never
/// derives ordering from wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalTimestamp {
    pub epoch: u64,
    pub logical: u64,
}

impl LogicalTimestamp {
    pub const GENESIS: LogicalTimestamp = LogicalTimestamp { epoch: 0, logical: 0 };

    pub fn new(epoch: u64, logical: u64) -> Self {
        Self { epoch, logical }
    }
}

impl PartialOrd for LogicalTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogicalTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.epoch, self.logical).cmp(&(other.epoch, other.logical))
    }
}

impl fmt::Display for LogicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.epoch, self.logical)
    }
}

// ── Opaque id newtypes ───────────────────────────────────────────────────────

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

opaque_id!(EntityId);
opaque_id!(ActionId);
opaque_id!(EvidenceId);
opaque_id!(AuthorityId);
opaque_id!(MetricId);
opaque_id!(ProtocolId);
opaque_id!(AttemptId);

// ── Action ───────────────────────────────────────────────────────────────────

/// The sole mutation request accepted by the kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub action_id: ActionId,
    pub initiator: EntityId,
    pub payload: Payload,
    pub timestamp: LogicalTimestamp,
    pub expires_at: Option<LogicalTimestamp>,
    /// ed25519 signature (hex) over the canonical signing string, or one of
    /// the sentinel strings (`TRUSTED`, `GOVERNANCE_SIGNATURE`).
    pub signature: String,
}

/// Mutation payload carried by an `Action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub metric_id: MetricId,
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_id: Option<ProtocolId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irreversible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rehearsal: Option<bool>,
    /// Set to `Some("COLLECTIVE")` when this action requires
    /// owner/synthesizer/dissent fields (CollectiveGuard).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesizer: Option<EntityId>,
    /// Must be present (though it may be `null`) when `kind = COLLECTIVE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dissent: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approvals: Option<Vec<EntityId>>,
}

impl Payload {
    pub fn is_irreversible(&self) -> bool {
        self.irreversible.unwrap_or(false)
    }

    pub fn is_rehearsal(&self) -> bool {
        self.rehearsal.unwrap_or(false)
    }

    pub fn is_collective(&self) -> bool {
        self.kind.as_deref() == Some("COLLECTIVE")
    }
}

// ── Metric ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricType {
    Counter,
    Gauge,
    Boolean,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    #[serde(rename = "type")]
    pub kind: MetricType,
    pub description: String,
    pub unit: String,
    /// Optional named validator applied to incoming values
    /// (see `gov_state::validator` for the registered set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

/// A single metric mutation produced either directly by an action's payload
/// or as a protocol side-effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricMutation {
    pub metric_id: MetricId,
    pub value: serde_json::Value,
}
