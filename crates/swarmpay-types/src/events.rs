//! Audit events emitted for history consumers
//!
//! Events are append-only. The API layer reads them; the core never
//! replays or mutates them.

use crate::{AgentId, Amount, BondEventId, ReputationEventId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of bond account movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondEventKind {
    Deposit,
    Withdraw,
    Lock,
    Unlock,
    Slash,
}

/// One bond account movement, for audit/history consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondEvent {
    pub id: BondEventId,
    pub agent_id: AgentId,
    pub kind: BondEventKind,
    pub amount: Amount,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// What happened to an agent's reputation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReputationEventKind {
    /// The swarm approved the agent's delivered work
    WorkApproved,
    /// The swarm rejected the agent's delivered work
    WorkRejected,
    /// A dispute was opened against or by the agent
    DisputeOpened,
    /// A dispute involving the agent was resolved
    DisputeResolved,
    /// Fresh scores arrived from the external oracle
    OracleUpdate,
}

/// A reputation change, for audit/history consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub id: ReputationEventId,
    pub agent_id: AgentId,
    pub kind: ReputationEventKind,
    /// Signed score delta applied by the event source
    pub score_change: i32,
    /// Which component emitted the event
    pub source: String,
    /// Optional link to off-system evidence
    pub proof_uri: Option<String>,
    /// Source-specific detail (oracle payload, dispute reference)
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ReputationEvent {
    /// The timestamp comes from the caller's clock, never from the wall
    /// clock here, so event history stays deterministic under test clocks.
    pub fn new(
        agent_id: AgentId,
        kind: ReputationEventKind,
        score_change: i32,
        source: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReputationEventId::new(),
            agent_id,
            kind,
            score_change,
            source: source.into(),
            proof_uri: None,
            metadata: serde_json::Value::Null,
            created_at: at,
        }
    }

    pub fn with_proof(mut self, uri: impl Into<String>) -> Self {
        self.proof_uri = Some(uri.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
