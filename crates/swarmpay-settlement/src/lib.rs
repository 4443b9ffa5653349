//! SwarmPay Settlement - chaining a consensus outcome into money movement
//!
//! The orchestrator is the only component that turns a validation outcome
//! into escrow release/refund, bond unlock/slash, and a reputation event.
//! Settlement runs exactly once per gig: a marker is committed atomically
//! with the effects under the per-gig lock, and any concurrent or
//! repeated trigger gets the recorded prior outcome back as a benign
//! no-op.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use swarmpay_bond::BondLedger;
use swarmpay_consensus::SettlementHook;
use swarmpay_escrow::EscrowLedger;
use swarmpay_reputation::{assess_risk, ReputationBook, RiskAssessment, RiskInputs};
use swarmpay_types::{
    AgentId, BondAccount, BondEventKind, Clock, CoreConfig, Escrow, EscrowStatus, GigId,
    ReputationEvent, ReputationEventKind, ResolveOutcome, Result, SettlementOutcome, SwarmPayError,
};

/// Reputation delta credited to the payee on approved work
pub const WORK_APPROVED_DELTA: i32 = 5;
/// Reputation delta charged to the payee on rejected work
pub const WORK_REJECTED_DELTA: i32 = -10;

/// What one settlement did, kept for replay answers and audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub gig_id: GigId,
    pub outcome: SettlementOutcome,
    pub escrow_status: EscrowStatus,
    /// `None` when the gig had no bond lock to resolve
    pub bond_resolution: Option<ResolveOutcome>,
    pub settled_at: DateTime<Utc>,
}

/// Whether this call did the work or found it already done
#[derive(Debug, Clone)]
pub enum Settlement {
    Applied(SettlementRecord),
    Replayed(SettlementRecord),
}

impl Settlement {
    pub fn record(&self) -> &SettlementRecord {
        match self {
            Self::Applied(r) | Self::Replayed(r) => r,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

pub struct SettlementOrchestrator {
    escrow: Arc<EscrowLedger>,
    bond: Arc<BondLedger>,
    reputation: Arc<ReputationBook>,
    settlements: DashMap<GigId, SettlementRecord>,
    gig_locks: DashMap<GigId, Arc<Mutex<()>>>,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
}

impl SettlementOrchestrator {
    pub fn new(
        config: CoreConfig,
        escrow: Arc<EscrowLedger>,
        bond: Arc<BondLedger>,
        reputation: Arc<ReputationBook>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            escrow,
            bond,
            reputation,
            settlements: DashMap::new(),
            gig_locks: DashMap::new(),
            config,
            clock,
        })
    }

    /// Settle a gig per the swarm's verdict
    ///
    /// Approved pays the payee (minus fee) and unlocks the bond; Rejected
    /// refunds the depositor and slashes the bond. The settlement marker
    /// commits only after every effect lands, so a failed settlement can
    /// be retried safely.
    pub async fn settle(&self, gig_id: GigId, outcome: SettlementOutcome) -> Result<Settlement> {
        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        if let Some(prior) = self.settlements.get(&gig_id) {
            return Ok(Settlement::Replayed(prior.clone()));
        }

        let escrow = self.escrow.escrow(&gig_id)?;
        let escrow = if escrow.status == Self::target_status(outcome) {
            // A retry after a partial earlier run; the escrow leg is done
            escrow
        } else if outcome.approved() {
            self.escrow.release(self.config.platform_admin, gig_id).await?
        } else {
            self.escrow.refund(self.config.platform_admin, gig_id).await?
        };

        self.complete(gig_id, outcome, escrow).await
    }

    /// Admin-forced resolution of a disputed gig, same exactly-once path
    pub async fn resolve_disputed(
        &self,
        gig_id: GigId,
        outcome: SettlementOutcome,
    ) -> Result<Settlement> {
        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        if let Some(prior) = self.settlements.get(&gig_id) {
            return Ok(Settlement::Replayed(prior.clone()));
        }

        let escrow = self.escrow.escrow(&gig_id)?;
        let escrow = if escrow.status == Self::target_status(outcome) {
            escrow
        } else {
            self.escrow
                .resolve_dispute(self.config.platform_admin, gig_id, outcome.approved())
                .await?
        };
        self.reputation.dispute_closed(escrow.payee).await;
        self.reputation
            .record_event(
                ReputationEvent::new(
                    escrow.payee,
                    ReputationEventKind::DisputeResolved,
                    0,
                    "settlement",
                    self.clock.now(),
                )
                .with_metadata(serde_json::json!({ "outcome": outcome.to_string() })),
            )
            .await;

        self.complete(gig_id, outcome, escrow).await
    }

    /// The recorded settlement for a gig, if it has settled
    pub fn settlement(&self, gig_id: &GigId) -> Option<SettlementRecord> {
        self.settlements.get(gig_id).map(|r| r.clone())
    }

    /// Risk view for an agent, composed from the bond and reputation
    /// histories this orchestrator already holds
    ///
    /// Agents without a bond account are scored on reputation data alone
    /// (an empty bond counts as fully depleted).
    pub async fn risk_profile(&self, agent: &AgentId) -> Result<RiskAssessment> {
        let now = self.clock.now();
        let profile = self.reputation.profile(agent).await?;
        let account = match self.bond.account(agent).await {
            Ok(account) => account,
            Err(SwarmPayError::BondAccountNotFound { .. }) => BondAccount::default(),
            Err(err) => return Err(err),
        };
        let bond_history = self.bond.history(agent).await;
        let reputation_events = self.reputation.events_for(agent).await;

        let slash_count = bond_history
            .iter()
            .filter(|e| e.kind == BondEventKind::Slash)
            .count() as u32;
        let failed_gigs = reputation_events
            .iter()
            .filter(|e| e.kind == ReputationEventKind::WorkRejected)
            .count() as u32;
        let disputes_resolved_against = reputation_events
            .iter()
            .filter(|e| {
                e.kind == ReputationEventKind::DisputeResolved && e.metadata["outcome"] == "rejected"
            })
            .count() as u32;

        let last_failure_at = reputation_events
            .iter()
            .filter(|e| e.kind == ReputationEventKind::WorkRejected)
            .map(|e| e.created_at)
            .chain(account.last_slash_at)
            .max();
        let clean_streak_days = match last_failure_at {
            Some(at) => (now - at).num_days(),
            // Nothing on record: the streak spans the observed history
            None => bond_history
                .first()
                .map(|e| (now - e.created_at).num_days())
                .unwrap_or(0),
        };

        let inputs = RiskInputs {
            slash_count,
            failed_gigs,
            open_disputes: profile.active_disputes,
            disputes_resolved_against,
            last_activity_at: profile.last_activity_at,
            bond_total: account.total,
            bond_available: account.available,
            clean_streak_days,
        };
        Ok(assess_risk(&inputs, now, &self.config.risk_bounds))
    }

    fn target_status(outcome: SettlementOutcome) -> EscrowStatus {
        if outcome.approved() {
            EscrowStatus::Released
        } else {
            EscrowStatus::Refunded
        }
    }

    fn gig_lock(&self, gig_id: GigId) -> Arc<Mutex<()>> {
        self.gig_locks
            .entry(gig_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Bond resolution + reputation event + marker commit; runs with the
    /// per-gig lock held and the escrow leg already applied
    async fn complete(
        &self,
        gig_id: GigId,
        outcome: SettlementOutcome,
        escrow: Escrow,
    ) -> Result<Settlement> {
        let bond_resolution = match self.bond.resolve_gig(gig_id, outcome.approved()).await {
            Ok(resolution) => Some(resolution),
            // Not every gig carries a bond lock
            Err(SwarmPayError::GigNotLocked { .. }) => None,
            Err(err) => return Err(err),
        };

        let (kind, delta) = if outcome.approved() {
            (ReputationEventKind::WorkApproved, WORK_APPROVED_DELTA)
        } else {
            (ReputationEventKind::WorkRejected, WORK_REJECTED_DELTA)
        };
        self.reputation
            .record_event(ReputationEvent::new(
                escrow.payee,
                kind,
                delta,
                "settlement",
                self.clock.now(),
            ))
            .await;
        if outcome.approved() {
            self.reputation.note_activity(escrow.payee).await;
        }

        let record = SettlementRecord {
            gig_id,
            outcome,
            escrow_status: escrow.status,
            bond_resolution,
            settled_at: self.clock.now(),
        };
        self.settlements.insert(gig_id, record.clone());
        info!("Gig {gig_id} settled: {outcome} (escrow {})", record.escrow_status);
        Ok(Settlement::Applied(record))
    }
}

#[async_trait]
impl SettlementHook for SettlementOrchestrator {
    async fn on_finalized(&self, gig_id: GigId, approved: bool) -> Result<()> {
        self.settle(gig_id, SettlementOutcome::from_approved(approved))
            .await
            .map(|_| ())
    }
}
