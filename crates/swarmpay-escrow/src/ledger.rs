//! The escrow ledger
//!
//! Operations on a gig are serialized through a per-gig async mutex, so
//! concurrent callers observe each transition exactly once. Record state
//! lives in a [`DashMap`]; custody lives in the wallet provider under the
//! escrow vault account.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use swarmpay_types::{
    AgentId, Amount, Clock, CoreConfig, Escrow, EscrowStatus, GigId, Result, SwarmPayError,
    TokenId, ValidationStatus,
};
use swarmpay_wallet::WalletProvider;

use crate::{auth, ConsensusQuery};

pub struct EscrowLedger {
    escrows: DashMap<GigId, Escrow>,
    gig_locks: DashMap<GigId, Arc<Mutex<()>>>,
    wallet: Arc<dyn WalletProvider>,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
}

impl EscrowLedger {
    pub fn new(
        config: CoreConfig,
        wallet: Arc<dyn WalletProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            escrows: DashMap::new(),
            gig_locks: DashMap::new(),
            wallet,
            config,
            clock,
        })
    }

    /// Create the gig's escrow and pull the funds into the vault
    pub async fn create_and_lock(
        &self,
        depositor: AgentId,
        payee: AgentId,
        gig_id: GigId,
        amount: Amount,
        token: TokenId,
    ) -> Result<Escrow> {
        if amount.is_zero() {
            return Err(SwarmPayError::InvalidAmount {
                reason: "escrow amount must be non-zero".to_string(),
            });
        }
        if depositor == payee {
            return Err(SwarmPayError::InvalidAmount {
                reason: "depositor and payee must differ".to_string(),
            });
        }
        if !self.config.approved_tokens.contains(&token) {
            return Err(SwarmPayError::TokenNotApproved {
                token: token.to_string(),
            });
        }

        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        if self.escrows.contains_key(&gig_id) {
            return Err(SwarmPayError::EscrowAlreadyExists {
                gig_id: gig_id.to_string(),
            });
        }

        self.wallet
            .transfer(&token, &depositor, &self.config.escrow_vault, amount)
            .await?;

        let escrow = Escrow {
            gig_id,
            depositor,
            payee,
            amount,
            token,
            status: EscrowStatus::Locked,
            created_at: self.clock.now(),
            resolved_at: None,
        };
        self.escrows.insert(gig_id, escrow.clone());

        info!("Escrow locked: {amount} for gig {gig_id} ({depositor} -> {payee})");
        Ok(escrow)
    }

    /// Pay the payee, minus the platform fee
    pub async fn release(&self, caller: AgentId, gig_id: GigId) -> Result<Escrow> {
        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        let escrow = self.locked_escrow(&gig_id, "release_escrow")?;
        if !auth::can_release(&caller, &escrow, &self.config) {
            return Err(SwarmPayError::NotAuthorized {
                caller: caller.to_string(),
                operation: "release_escrow",
            });
        }

        self.pay_out(&escrow).await?;
        Ok(self.commit(escrow, EscrowStatus::Released))
    }

    /// Return the full amount to the depositor; no fee on refunds
    pub async fn refund(&self, caller: AgentId, gig_id: GigId) -> Result<Escrow> {
        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        let escrow = self.locked_escrow(&gig_id, "refund_escrow")?;
        if !auth::can_refund(&caller, &escrow, &self.config) {
            return Err(SwarmPayError::NotAuthorized {
                caller: caller.to_string(),
                operation: "refund_escrow",
            });
        }

        self.refund_funds(&escrow).await?;
        Ok(self.commit(escrow, EscrowStatus::Refunded))
    }

    /// Refund a stale escrow once the timeout has elapsed
    ///
    /// Callable by anyone. A no-op returning the current record when the
    /// escrow is already resolved, so repeat triggers are benign.
    pub async fn refund_after_timeout(&self, gig_id: GigId) -> Result<Escrow> {
        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        let escrow = self.escrow(&gig_id)?;
        if escrow.status.is_terminal() {
            return Ok(escrow);
        }
        if escrow.status != EscrowStatus::Locked {
            return Err(SwarmPayError::WrongState {
                operation: "refund_after_timeout",
                state: escrow.status.to_string(),
            });
        }

        let deadline = escrow.created_at + self.config.escrow_timeout;
        if self.clock.now() < deadline {
            return Err(SwarmPayError::TimeoutNotElapsed {
                deadline: deadline.to_rfc3339(),
            });
        }

        self.refund_funds(&escrow).await?;
        warn!("Escrow timed out, refunding gig {gig_id}");
        Ok(self.commit(escrow, EscrowStatus::Refunded))
    }

    /// Freeze the escrow pending an authorized decision
    pub async fn dispute(&self, caller: AgentId, gig_id: GigId) -> Result<Escrow> {
        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        let escrow = self.locked_escrow(&gig_id, "dispute_escrow")?;
        if !auth::can_dispute(&caller, &escrow) {
            return Err(SwarmPayError::NotAuthorized {
                caller: caller.to_string(),
                operation: "dispute_escrow",
            });
        }

        warn!("Escrow disputed for gig {gig_id} by {caller}");
        Ok(self.commit(escrow, EscrowStatus::Disputed))
    }

    /// Resolve a disputed escrow, paying out or refunding
    pub async fn resolve_dispute(
        &self,
        caller: AgentId,
        gig_id: GigId,
        release: bool,
    ) -> Result<Escrow> {
        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        if !auth::can_resolve_dispute(&caller, &self.config) {
            return Err(SwarmPayError::NotAuthorized {
                caller: caller.to_string(),
                operation: "resolve_dispute",
            });
        }

        let escrow = self.escrow(&gig_id)?;
        if escrow.status != EscrowStatus::Disputed {
            return Err(SwarmPayError::WrongState {
                operation: "resolve_dispute",
                state: escrow.status.to_string(),
            });
        }

        let next = if release {
            self.pay_out(&escrow).await?;
            EscrowStatus::Released
        } else {
            self.refund_funds(&escrow).await?;
            EscrowStatus::Refunded
        };
        info!("Dispute resolved for gig {gig_id}: {next}");
        Ok(self.commit(escrow, next))
    }

    /// Release driven by an approved swarm validation round
    pub async fn release_on_consensus_approval(
        &self,
        caller: AgentId,
        gig_id: GigId,
        consensus: &dyn ConsensusQuery,
    ) -> Result<Escrow> {
        let aggregate = consensus.aggregate_for_gig(&gig_id).await?;
        match aggregate.status {
            ValidationStatus::Approved => {}
            ValidationStatus::Expired => {
                return Err(SwarmPayError::ValidationExpired {
                    gig_id: gig_id.to_string(),
                })
            }
            _ => {
                return Err(SwarmPayError::ConsensusNotReached {
                    gig_id: gig_id.to_string(),
                    votes_for: aggregate.votes_for,
                    threshold: aggregate.threshold,
                })
            }
        }

        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        let escrow = self.locked_escrow(&gig_id, "release_on_consensus")?;
        if !auth::can_release_on_consensus(&caller, &escrow, &self.config) {
            return Err(SwarmPayError::NotAuthorized {
                caller: caller.to_string(),
                operation: "release_on_consensus",
            });
        }
        self.pay_out(&escrow).await?;
        info!("Consensus release for gig {gig_id}");
        Ok(self.commit(escrow, EscrowStatus::Released))
    }

    /// The escrow record for a gig
    pub fn escrow(&self, gig_id: &GigId) -> Result<Escrow> {
        self.escrows
            .get(gig_id)
            .map(|e| e.clone())
            .ok_or_else(|| SwarmPayError::EscrowNotFound {
                gig_id: gig_id.to_string(),
            })
    }

    /// Time left before anyone may trigger the timeout refund
    pub fn time_to_timeout(&self, gig_id: &GigId) -> Result<Duration> {
        let escrow = self.escrow(gig_id)?;
        let deadline = escrow.created_at + self.config.escrow_timeout;
        Ok(deadline - self.clock.now())
    }

    fn gig_lock(&self, gig_id: GigId) -> Arc<Mutex<()>> {
        self.gig_locks
            .entry(gig_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fetch the escrow, requiring it to still be in `Locked`
    fn locked_escrow(&self, gig_id: &GigId, operation: &'static str) -> Result<Escrow> {
        let escrow = self.escrow(gig_id)?;
        if escrow.status != EscrowStatus::Locked {
            return Err(SwarmPayError::WrongState {
                operation,
                state: escrow.status.to_string(),
            });
        }
        Ok(escrow)
    }

    /// Two-leg payout: payee gets `amount - fee`, the sink gets the fee.
    /// A failed fee leg reverses the payout leg before surfacing the
    /// error, so the vault is never short.
    async fn pay_out(&self, escrow: &Escrow) -> Result<()> {
        let fee = escrow.amount.fraction_bps(self.config.fee_bps)?;
        let payout = escrow.amount.checked_sub(fee)?;

        let payout_leg = self
            .wallet
            .transfer(
                &escrow.token,
                &self.config.escrow_vault,
                &escrow.payee,
                payout,
            )
            .await?;

        if !fee.is_zero() {
            if let Err(err) = self
                .wallet
                .transfer(
                    &escrow.token,
                    &self.config.escrow_vault,
                    &self.config.platform_sink,
                    fee,
                )
                .await
            {
                warn!(
                    "Fee leg failed for gig {}, reversing payout leg: {err}",
                    escrow.gig_id
                );
                if let Err(rollback) = self.wallet.reverse(&payout_leg).await {
                    warn!("Payout rollback also failed for gig {}: {rollback}", escrow.gig_id);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    async fn refund_funds(&self, escrow: &Escrow) -> Result<()> {
        self.wallet
            .transfer(
                &escrow.token,
                &self.config.escrow_vault,
                &escrow.depositor,
                escrow.amount,
            )
            .await?;
        Ok(())
    }

    fn commit(&self, mut escrow: Escrow, next: EscrowStatus) -> Escrow {
        debug_assert!(escrow.can_transition_to(next));
        escrow.status = next;
        if next.is_terminal() {
            escrow.resolved_at = Some(self.clock.now());
        }
        self.escrows.insert(escrow.gig_id, escrow.clone());
        escrow
    }
}
