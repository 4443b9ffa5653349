//! Swarm validation rounds and votes

use crate::{AgentId, Amount, GigId, ValidationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle status of a validation round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// Collecting votes
    Pending,
    /// Approving votes reached the threshold
    Approved,
    /// Rejecting votes reached the threshold
    Rejected,
    /// The round passed its deadline without a quorum
    Expired,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Expired => "Expired",
        };
        write!(f, "{s}")
    }
}

/// A validator's verdict on delivered work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
    Approve,
    Reject,
}

/// One vote per (validation, voter)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub validation_id: ValidationId,
    pub voter: AgentId,
    pub choice: VoteChoice,
    pub reward_claimed: bool,
    pub cast_at: DateTime<Utc>,
}

/// A committee validation round for one gig
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    pub id: ValidationId,
    pub gig_id: GigId,
    pub committee: Vec<AgentId>,
    pub votes: HashMap<AgentId, Vote>,
    pub votes_for: u32,
    pub votes_against: u32,
    pub threshold: u32,
    pub reward_pool: Amount,
    pub status: ValidationStatus,
    /// Set exactly once, atomically with the status flip
    pub finalized: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Validation {
    /// Vote-count invariant: counters never exceed the committee size
    pub fn counts_are_consistent(&self) -> bool {
        (self.votes_for + self.votes_against) as usize <= self.committee.len()
            && self.votes.len() == (self.votes_for + self.votes_against) as usize
    }
}

/// The swarm's final verdict on a gig, as settlement consumes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    Approved,
    Rejected,
}

impl SettlementOutcome {
    pub fn from_approved(approved: bool) -> Self {
        if approved {
            Self::Approved
        } else {
            Self::Rejected
        }
    }

    pub fn approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for SettlementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Read-only aggregate used for consensus-gated escrow release
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteAggregate {
    pub votes_for: u32,
    pub votes_against: u32,
    pub threshold: u32,
    pub status: ValidationStatus,
    pub approved: bool,
}
