//! SwarmPay Bond - per-agent collateral ledger
//!
//! Agents post collateral before taking on valuable work. Portions are
//! locked per gig and slashed (bounded) on failure. Locking is gated on a
//! live performance check: an agent below the configured minimum is not
//! rejected — a bounded fraction of the requested amount is slashed
//! immediately instead. The punitive gate is policy, not an error path;
//! callers get a [`LockOutcome::AutoSlashed`] result.
//!
//! # Invariants
//!
//! 1. `available + locked == total` at every observable point
//! 2. `total` only decreases via withdraw or slash
//! 3. No balance ever goes negative; all arithmetic is checked
//! 4. One open lock per gig; `resolve_gig` is idempotent

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use swarmpay_reputation::ReputationBook;
use swarmpay_types::{
    AgentId, Amount, BondAccount, BondEvent, BondEventId, BondEventKind, BondLock, BondLockStatus,
    Clock, CoreConfig, GigId, LockOutcome, ResolveOutcome, Result, SwarmPayError,
};
use swarmpay_wallet::WalletProvider;

/// Live performance score for the lock gate
///
/// Supplied by the reputation side; the bond ledger never computes scores
/// itself.
#[async_trait]
pub trait ScoreSource: Send + Sync {
    async fn performance_score(&self, agent: &AgentId) -> Result<u8>;
}

#[async_trait]
impl ScoreSource for ReputationBook {
    async fn performance_score(&self, agent: &AgentId) -> Result<u8> {
        Ok(self.profile(agent).await?.effective_score)
    }
}

/// The bond ledger
///
/// Collateral custody lives in the wallet provider under the bond vault
/// account; this ledger is the authoritative record of who owns what.
pub struct BondLedger {
    accounts: Arc<RwLock<HashMap<AgentId, BondAccount>>>,
    locks: Arc<RwLock<HashMap<GigId, (AgentId, BondLock)>>>,
    events: Arc<RwLock<Vec<BondEvent>>>,
    wallet: Arc<dyn WalletProvider>,
    scores: Arc<dyn ScoreSource>,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
}

impl BondLedger {
    pub fn new(
        config: CoreConfig,
        wallet: Arc<dyn WalletProvider>,
        scores: Arc<dyn ScoreSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            locks: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
            wallet,
            scores,
            config,
            clock,
        })
    }

    /// Deposit collateral: agent wallet -> bond vault
    pub async fn deposit(&self, agent: AgentId, amount: Amount) -> Result<BondAccount> {
        if amount < self.config.min_deposit {
            return Err(SwarmPayError::BelowMinimumDeposit {
                amount: amount.0,
                minimum: self.config.min_deposit.0,
            });
        }

        let mut accounts = self.accounts.write().await;
        let account = accounts.entry(agent).or_default();
        // Validate the arithmetic before moving money
        let new_total = account.total.checked_add(amount)?;
        let new_available = account.available.checked_add(amount)?;

        self.wallet
            .transfer(&self.config.bond_token, &agent, &self.config.bond_vault, amount)
            .await?;

        account.total = new_total;
        account.available = new_available;
        let snapshot = account.clone();
        drop(accounts);

        self.push_event(agent, BondEventKind::Deposit, amount, "bond deposit")
            .await;
        info!("Bond deposit: {amount} from {agent}");
        Ok(snapshot)
    }

    /// Withdraw unlocked collateral: bond vault -> agent wallet
    pub async fn withdraw(&self, agent: AgentId, amount: Amount) -> Result<BondAccount> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&agent)
            .ok_or_else(|| SwarmPayError::BondAccountNotFound {
                agent_id: agent.to_string(),
            })?;

        if amount > account.available {
            return Err(SwarmPayError::InsufficientAvailableBond {
                requested: amount.0,
                available: account.available.0,
            });
        }
        let new_total = account.total.checked_sub(amount)?;
        let new_available = account.available.checked_sub(amount)?;

        self.wallet
            .transfer(&self.config.bond_token, &self.config.bond_vault, &agent, amount)
            .await?;

        account.total = new_total;
        account.available = new_available;
        let snapshot = account.clone();
        drop(accounts);

        self.push_event(agent, BondEventKind::Withdraw, amount, "bond withdrawal")
            .await;
        Ok(snapshot)
    }

    /// Lock collateral against a gig, behind the live performance gate
    ///
    /// Below-minimum performance does not reject: it slashes a bounded
    /// fraction of the *requested* amount and creates no lock. The caller
    /// receives [`LockOutcome::AutoSlashed`], not an error.
    pub async fn lock_for_gig(
        &self,
        agent: AgentId,
        gig_id: GigId,
        amount: Amount,
    ) -> Result<LockOutcome> {
        if amount.is_zero() {
            return Err(SwarmPayError::InvalidAmount {
                reason: "lock amount must be non-zero".to_string(),
            });
        }

        let score = self.scores.performance_score(&agent).await?;

        let mut accounts = self.accounts.write().await;
        let mut locks = self.locks.write().await;
        let account = accounts
            .get_mut(&agent)
            .ok_or_else(|| SwarmPayError::BondAccountNotFound {
                agent_id: agent.to_string(),
            })?;

        if score < self.config.min_performance_score {
            // Punitive gate: slash instead of lock. Bounded by slash_bps
            // (itself capped at 20%) and by what the agent actually has.
            let slashed = amount
                .fraction_bps(self.config.slash_bps)?
                .min(account.available);
            let new_available = account.available.checked_sub(slashed)?;
            let new_total = account.total.checked_sub(slashed)?;
            let new_cumulative = account.cumulative_slashed.checked_add(slashed)?;

            self.pay_sink(slashed).await?;
            account.available = new_available;
            account.total = new_total;
            account.cumulative_slashed = new_cumulative;
            account.last_slash_at = Some(self.clock.now());
            drop(locks);
            drop(accounts);

            warn!(
                "Auto-slash gate fired for {agent} on gig {gig_id}: score {score} < {}, slashed {slashed}",
                self.config.min_performance_score
            );
            self.push_event(
                agent,
                BondEventKind::Slash,
                slashed,
                "performance below lock minimum",
            )
            .await;
            return Ok(LockOutcome::AutoSlashed {
                gig_id,
                requested: amount,
                slashed,
                performance_score: score,
            });
        }

        if let Some((_, lock)) = locks.get(&gig_id) {
            if lock.status == BondLockStatus::Open {
                return Err(SwarmPayError::GigAlreadyLocked {
                    gig_id: gig_id.to_string(),
                });
            }
        }
        if amount > account.available {
            return Err(SwarmPayError::InsufficientBond {
                requested: amount.0,
                available: account.available.0,
            });
        }

        account.available = account.available.checked_sub(amount)?;
        account.locked = account.locked.checked_add(amount)?;
        locks.insert(
            gig_id,
            (
                agent,
                BondLock {
                    gig_id,
                    amount,
                    status: BondLockStatus::Open,
                    created_at: self.clock.now(),
                    resolved_at: None,
                },
            ),
        );
        drop(locks);
        drop(accounts);

        self.push_event(agent, BondEventKind::Lock, amount, "locked for gig")
            .await;
        info!("Bond lock: {amount} by {agent} for gig {gig_id}");
        Ok(LockOutcome::Locked { gig_id, amount })
    }

    /// Resolve a gig's lock: unlock on success, slash a bounded fraction
    /// on failure. Idempotent — repeat calls are benign no-ops.
    pub async fn resolve_gig(&self, gig_id: GigId, success: bool) -> Result<ResolveOutcome> {
        let mut accounts = self.accounts.write().await;
        let mut locks = self.locks.write().await;

        let (agent, lock) = locks
            .get_mut(&gig_id)
            .map(|(a, l)| (*a, l))
            .ok_or_else(|| SwarmPayError::GigNotLocked {
                gig_id: gig_id.to_string(),
            })?;

        if lock.status != BondLockStatus::Open {
            return Ok(ResolveOutcome::AlreadyResolved);
        }

        let account = accounts
            .get_mut(&agent)
            .ok_or_else(|| SwarmPayError::BondAccountNotFound {
                agent_id: agent.to_string(),
            })?;
        let now = self.clock.now();
        let locked_amount = lock.amount;

        if success {
            account.locked = account.locked.checked_sub(locked_amount)?;
            account.available = account.available.checked_add(locked_amount)?;
            lock.status = BondLockStatus::Unlocked;
            lock.resolved_at = Some(now);
            drop(locks);
            drop(accounts);

            self.push_event(agent, BondEventKind::Unlock, locked_amount, "gig succeeded")
                .await;
            info!("Bond unlock: {locked_amount} for gig {gig_id}");
            return Ok(ResolveOutcome::Unlocked {
                amount: locked_amount,
            });
        }

        let slashed = locked_amount.fraction_bps(self.config.slash_bps)?;
        let returned = locked_amount.checked_sub(slashed)?;
        let new_locked = account.locked.checked_sub(locked_amount)?;
        let new_available = account.available.checked_add(returned)?;
        let new_total = account.total.checked_sub(slashed)?;
        let new_cumulative = account.cumulative_slashed.checked_add(slashed)?;

        self.pay_sink(slashed).await?;
        account.locked = new_locked;
        account.available = new_available;
        account.total = new_total;
        account.cumulative_slashed = new_cumulative;
        account.last_slash_at = Some(now);
        lock.status = BondLockStatus::Slashed;
        lock.resolved_at = Some(now);
        drop(locks);
        drop(accounts);

        self.push_event(agent, BondEventKind::Slash, slashed, "gig failed")
            .await;
        self.push_event(agent, BondEventKind::Unlock, returned, "remainder after slash")
            .await;
        warn!("Bond slash: {slashed} from {agent} for gig {gig_id}");
        Ok(ResolveOutcome::Slashed { slashed, returned })
    }

    /// Pay slashed collateral from the bond vault to the platform sink
    async fn pay_sink(&self, slashed: Amount) -> Result<()> {
        if slashed.is_zero() {
            return Ok(());
        }
        self.wallet
            .transfer(
                &self.config.bond_token,
                &self.config.bond_vault,
                &self.config.platform_sink,
                slashed,
            )
            .await?;
        Ok(())
    }

    /// Bond status for an agent
    pub async fn account(&self, agent: &AgentId) -> Result<BondAccount> {
        let accounts = self.accounts.read().await;
        accounts
            .get(agent)
            .cloned()
            .ok_or_else(|| SwarmPayError::BondAccountNotFound {
                agent_id: agent.to_string(),
            })
    }

    /// Bond event history for an agent, oldest first
    pub async fn history(&self, agent: &AgentId) -> Vec<BondEvent> {
        let events = self.events.read().await;
        events
            .iter()
            .filter(|e| &e.agent_id == agent)
            .cloned()
            .collect()
    }

    /// The lock record for a gig, if any
    pub async fn lock(&self, gig_id: &GigId) -> Option<BondLock> {
        let locks = self.locks.read().await;
        locks.get(gig_id).map(|(_, l)| l.clone())
    }

    async fn push_event(&self, agent: AgentId, kind: BondEventKind, amount: Amount, reason: &str) {
        let mut events = self.events.write().await;
        events.push(BondEvent {
            id: BondEventId::new(),
            agent_id: agent,
            kind,
            amount,
            reason: reason.to_string(),
            created_at: self.clock.now(),
        });
    }
}
