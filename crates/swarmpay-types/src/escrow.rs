//! Escrow records
//!
//! One escrow per gig, moving along
//! `Pending → Locked → {Released | Refunded | Disputed}` and
//! `Disputed → {Released | Refunded}`. Resolved records are immutable.

use crate::{AgentId, Amount, GigId, TokenId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Escrow lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// Created, funds not yet locked
    Pending,
    /// Funds held; release/refund/dispute paths open
    Locked,
    /// Paid out to the payee (terminal)
    Released,
    /// Returned to the depositor (terminal)
    Refunded,
    /// Frozen pending an authorized decision
    Disputed,
}

impl EscrowStatus {
    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Locked => "Locked",
            Self::Released => "Released",
            Self::Refunded => "Refunded",
            Self::Disputed => "Disputed",
        };
        write!(f, "{s}")
    }
}

/// A per-gig fund-holding record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escrow {
    pub gig_id: GigId,
    pub depositor: AgentId,
    pub payee: AgentId,
    pub amount: Amount,
    pub token: TokenId,
    pub status: EscrowStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Escrow {
    /// Legal transitions of the escrow state machine
    pub fn can_transition_to(&self, next: EscrowStatus) -> bool {
        use EscrowStatus::*;
        matches!(
            (self.status, next),
            (Pending, Locked)
                | (Locked, Released)
                | (Locked, Refunded)
                | (Locked, Disputed)
                | (Disputed, Released)
                | (Disputed, Refunded)
        )
    }
}
