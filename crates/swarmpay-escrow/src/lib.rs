//! SwarmPay Escrow - per-gig fund custody
//!
//! Each gig gets at most one escrow. Funds move from the depositor into
//! the escrow vault on creation and leave it exactly once, either to the
//! payee (release, minus the platform fee) or back to the depositor
//! (refund). Disputes freeze the record until the platform administrator
//! resolves them.
//!
//! # Invariants
//!
//! 1. At most one escrow per gig, ever
//! 2. Resolved escrows are immutable
//! 3. State and funds commit together: a failed payout leg rolls back the
//!    already-executed legs before the error surfaces
//! 4. Fee is charged on release only, never on refund

mod auth;
mod ledger;

pub use auth::{
    can_dispute, can_refund, can_release, can_release_on_consensus, can_resolve_dispute,
};
pub use ledger::EscrowLedger;

use async_trait::async_trait;
use swarmpay_types::{GigId, Result, VoteAggregate};

/// Read-side view into swarm validation, for consensus-driven release
#[async_trait]
pub trait ConsensusQuery: Send + Sync {
    /// The current vote aggregate for the gig's validation round
    async fn aggregate_for_gig(&self, gig_id: &GigId) -> Result<VoteAggregate>;
}
