//! Bond account and lock records

use crate::{Amount, GigId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-agent collateral account
///
/// Invariant at every observable point: `available + locked == total`,
/// with `total` only decreasing via withdraw or slash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BondAccount {
    pub total: Amount,
    pub available: Amount,
    pub locked: Amount,
    pub cumulative_slashed: Amount,
    pub last_slash_at: Option<DateTime<Utc>>,
}

impl BondAccount {
    /// Check the conservation invariant
    pub fn is_conserved(&self) -> bool {
        self.available
            .checked_add(self.locked)
            .map(|sum| sum == self.total)
            .unwrap_or(false)
    }
}

/// Lifecycle state of a per-gig bond lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondLockStatus {
    /// Collateral held against an in-flight gig
    Open,
    /// Gig succeeded; collateral returned to available
    Unlocked,
    /// Gig failed; a bounded fraction was slashed
    Slashed,
}

/// A single gig's collateral lock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondLock {
    pub gig_id: GigId,
    pub amount: Amount,
    pub status: BondLockStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Outcome of `lock_for_gig`
///
/// Locking can succeed, or — when the agent's live performance score is
/// below the configured minimum — punitively slash instead. The slash is
/// a result, not an error: the caller's request was well-formed, the
/// policy answer is a penalty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LockOutcome {
    /// Collateral moved from available to locked
    Locked { gig_id: GigId, amount: Amount },
    /// Performance gate fired: no lock created, a bounded fraction of the
    /// requested amount slashed
    AutoSlashed {
        gig_id: GigId,
        requested: Amount,
        slashed: Amount,
        performance_score: u8,
    },
}

/// Outcome of `resolve_gig`; repeat calls are benign no-ops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResolveOutcome {
    /// Lock released back to available
    Unlocked { amount: Amount },
    /// A bounded fraction of the lock slashed, remainder released
    Slashed { slashed: Amount, returned: Amount },
    /// The gig was already resolved; nothing changed
    AlreadyResolved,
}
