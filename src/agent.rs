//! Agent identity. Authentication itself, verifying a wallet
//! signature and minting a session, is an external collaborator;
//! this crate only needs the resulting stable identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        AgentId(s)
    }
}

/// An agent's aggregate stats are derived projections: they are never
/// read back into game logic, only surfaced for display.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentStats {
    pub games_played: u64,
    pub cumulative_profit_cents: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub display_name: String,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>, display_name: impl Into<String>) -> Self {
        Agent {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}
