use gov_core::types::{LogicalTimestamp, ProtocolId};
use serde::{Deserialize, Serialize};

use crate::predicate::Predicate;
use crate::rule::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lifecycle {
  Proposed,
  Ratified,
  Active,
  Deprecated,
  Revoked,
}

/// A registered conditional side-effect rule, triggered during commit
///.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protocol {
  pub id: ProtocolId,
  pub lifecycle: Lifecycle,
  pub preconditions: Vec<Predicate>,
  pub execution: Vec<Rule>,
  pub proposed_at: LogicalTimestamp,
}

impl Protocol {
  pub fn proposed(id: ProtocolId, preconditions: Vec<Predicate>, execution: Vec<Rule>, proposed_at: LogicalTimestamp) -> Self {
    Self { id, lifecycle: Lifecycle::Proposed, preconditions, execution, proposed_at }
  }

  pub fn is_active(&self) -> bool {
    self.lifecycle == Lifecycle::Active
  }
}
