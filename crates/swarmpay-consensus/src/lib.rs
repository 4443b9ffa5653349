//! SwarmPay Consensus - committee validation of delivered work
//!
//! A validation round selects the top-reputation eligible agents as a
//! committee and collects approve/reject votes. The single vote that
//! first reaches the threshold finalizes the round through an atomic
//! check-and-set on the `finalized` flag; the settlement hook fires
//! exactly once, and the reward pool is split evenly among the voters on
//! the winning side.
//!
//! # Invariants
//!
//! 1. `finalized` flips at most once per round, atomically with the
//!    status change
//! 2. Votes after finalization or expiry never touch the counters
//! 3. One vote per (round, voter); only committee members vote
//! 4. Losing-side voters receive no reward; the integer-division
//!    remainder stays in the pool account

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use swarmpay_escrow::ConsensusQuery;
use swarmpay_types::{
    AgentId, Amount, Clock, CoreConfig, GigId, Result, SwarmPayError, Validation, ValidationId,
    ValidationStatus, Vote, VoteAggregate, VoteChoice,
};
use swarmpay_wallet::WalletProvider;

/// Supplies the eligible validator set with fused scores
#[async_trait]
pub trait ValidatorDirectory: Send + Sync {
    async fn eligible_validators(&self) -> Result<Vec<(AgentId, u8)>>;
}

/// Downstream settlement, triggered exactly once per finalized round
#[async_trait]
pub trait SettlementHook: Send + Sync {
    async fn on_finalized(&self, gig_id: GigId, approved: bool) -> Result<()>;
}

/// Outcome of the finalizing vote, carried out of the entry lock
struct FinalizedRound {
    gig_id: GigId,
    approved: bool,
    winners: Vec<AgentId>,
    reward_pool: Amount,
}

pub struct SwarmCoordinator {
    validations: DashMap<ValidationId, Validation>,
    by_gig: DashMap<GigId, ValidationId>,
    gig_locks: DashMap<GigId, Arc<Mutex<()>>>,
    directory: Arc<dyn ValidatorDirectory>,
    hook: Arc<dyn SettlementHook>,
    wallet: Arc<dyn WalletProvider>,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
}

impl SwarmCoordinator {
    pub fn new(
        config: CoreConfig,
        directory: Arc<dyn ValidatorDirectory>,
        hook: Arc<dyn SettlementHook>,
        wallet: Arc<dyn WalletProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            validations: DashMap::new(),
            by_gig: DashMap::new(),
            gig_locks: DashMap::new(),
            directory,
            hook,
            wallet,
            config,
            clock,
        })
    }

    /// Open a validation round for delivered work
    ///
    /// Selects the top `committee_size` eligible validators by fused
    /// score, excluding the gig's poster and assignee. The reward pool is
    /// carved from the gig budget at `validator_reward_bps`. The whole
    /// operation holds the per-gig gate, so concurrent initiations for
    /// one gig serialize and at most one round goes live.
    pub async fn initiate_validation(
        &self,
        gig_id: GigId,
        poster: AgentId,
        assignee: AgentId,
        budget: Amount,
    ) -> Result<Validation> {
        let gate = self.gig_lock(gig_id);
        let _serial = gate.lock().await;

        if let Some(existing_id) = self.by_gig.get(&gig_id).map(|v| *v) {
            if let Some(existing) = self.validations.get(&existing_id) {
                // Only an expired round may be superseded
                let overdue = existing.status == ValidationStatus::Pending
                    && self.clock.now() > existing.expires_at;
                if existing.status != ValidationStatus::Expired && !overdue {
                    return Err(SwarmPayError::WrongState {
                        operation: "initiate_validation",
                        state: existing.status.to_string(),
                    });
                }
            }
        }

        let mut candidates: Vec<(AgentId, u8)> = self
            .directory
            .eligible_validators()
            .await?
            .into_iter()
            .filter(|(agent, _)| *agent != poster && *agent != assignee)
            .collect();
        if candidates.len() < self.config.committee_size {
            return Err(SwarmPayError::InsufficientValidators {
                eligible: candidates.len(),
                required: self.config.committee_size,
            });
        }
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        let committee: Vec<AgentId> = candidates
            .into_iter()
            .take(self.config.committee_size)
            .map(|(agent, _)| agent)
            .collect();

        let now = self.clock.now();
        let validation = Validation {
            id: ValidationId::new(),
            gig_id,
            committee,
            votes: Default::default(),
            votes_for: 0,
            votes_against: 0,
            threshold: self.config.vote_threshold,
            reward_pool: budget.fraction_bps(self.config.validator_reward_bps)?,
            status: ValidationStatus::Pending,
            finalized: false,
            created_at: now,
            expires_at: now + self.config.validation_expiry,
            finalized_at: None,
        };
        self.by_gig.insert(gig_id, validation.id);
        self.validations.insert(validation.id, validation.clone());

        info!(
            "Validation opened for gig {gig_id}: committee of {}, threshold {}, pool {}",
            validation.committee.len(),
            validation.threshold,
            validation.reward_pool
        );
        Ok(validation)
    }

    /// Cast a vote; the threshold-crossing vote finalizes the round
    ///
    /// All checks and the finalize check-and-set run under the exclusive
    /// entry lock, so concurrent voters can never both finalize. The
    /// settlement hook and reward payout happen after the lock drops.
    pub async fn vote(
        &self,
        validation_id: ValidationId,
        voter: AgentId,
        choice: VoteChoice,
    ) -> Result<VoteAggregate> {
        let now = self.clock.now();

        let (aggregate, finalized) = {
            let mut entry = self.validations.get_mut(&validation_id).ok_or_else(|| {
                SwarmPayError::ValidationNotFound {
                    validation_id: validation_id.to_string(),
                }
            })?;
            let v = entry.value_mut();

            if v.status == ValidationStatus::Pending && now > v.expires_at {
                v.status = ValidationStatus::Expired;
                return Err(SwarmPayError::ValidationExpired {
                    gig_id: v.gig_id.to_string(),
                });
            }
            if v.finalized || v.status != ValidationStatus::Pending {
                return Err(SwarmPayError::AlreadyFinalized {
                    validation_id: validation_id.to_string(),
                });
            }
            if !v.committee.contains(&voter) {
                return Err(SwarmPayError::NotSelectedValidator {
                    voter: voter.to_string(),
                    validation_id: validation_id.to_string(),
                });
            }
            if v.votes.contains_key(&voter) {
                return Err(SwarmPayError::AlreadyVoted {
                    voter: voter.to_string(),
                    validation_id: validation_id.to_string(),
                });
            }

            v.votes.insert(
                voter,
                Vote {
                    validation_id,
                    voter,
                    choice,
                    reward_claimed: false,
                    cast_at: now,
                },
            );
            match choice {
                VoteChoice::Approve => v.votes_for += 1,
                VoteChoice::Reject => v.votes_against += 1,
            }
            debug_assert!(v.counts_are_consistent());

            let finalized = if v.votes_for >= v.threshold {
                Some(self.finalize(v, true, now))
            } else if v.votes_against >= v.threshold {
                Some(self.finalize(v, false, now))
            } else {
                None
            };

            (
                VoteAggregate {
                    votes_for: v.votes_for,
                    votes_against: v.votes_against,
                    threshold: v.threshold,
                    status: v.status,
                    approved: v.status == ValidationStatus::Approved,
                },
                finalized,
            )
        };

        if let Some(round) = finalized {
            self.distribute_rewards(&round).await;
            self.hook.on_finalized(round.gig_id, round.approved).await?;
        }
        Ok(aggregate)
    }

    /// The running tally for a gig's round
    ///
    /// Read-only except for lazily marking an overdue Pending round
    /// Expired.
    pub fn aggregate_votes(&self, gig_id: GigId) -> Result<VoteAggregate> {
        let validation_id =
            self.by_gig
                .get(&gig_id)
                .map(|v| *v)
                .ok_or_else(|| SwarmPayError::ValidationNotFound {
                    validation_id: gig_id.to_string(),
                })?;
        let mut entry = self.validations.get_mut(&validation_id).ok_or_else(|| {
            SwarmPayError::ValidationNotFound {
                validation_id: validation_id.to_string(),
            }
        })?;
        let v = entry.value_mut();

        if v.status == ValidationStatus::Pending && self.clock.now() > v.expires_at {
            warn!("Validation for gig {gig_id} expired without quorum");
            v.status = ValidationStatus::Expired;
        }
        Ok(VoteAggregate {
            votes_for: v.votes_for,
            votes_against: v.votes_against,
            threshold: v.threshold,
            status: v.status,
            approved: v.status == ValidationStatus::Approved,
        })
    }

    pub fn validation(&self, validation_id: &ValidationId) -> Result<Validation> {
        self.validations
            .get(validation_id)
            .map(|v| v.clone())
            .ok_or_else(|| SwarmPayError::ValidationNotFound {
                validation_id: validation_id.to_string(),
            })
    }

    pub fn validation_for_gig(&self, gig_id: &GigId) -> Result<Validation> {
        let validation_id =
            self.by_gig
                .get(gig_id)
                .map(|v| *v)
                .ok_or_else(|| SwarmPayError::ValidationNotFound {
                    validation_id: gig_id.to_string(),
                })?;
        self.validation(&validation_id)
    }

    /// Votes cast in a round, in no particular order
    pub fn votes(&self, validation_id: &ValidationId) -> Result<Vec<Vote>> {
        Ok(self
            .validation(validation_id)?
            .votes
            .into_values()
            .collect())
    }

    fn gig_lock(&self, gig_id: GigId) -> Arc<Mutex<()>> {
        self.gig_locks
            .entry(gig_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Flip the round to its terminal status; runs under the entry lock
    fn finalize(
        &self,
        v: &mut Validation,
        approved: bool,
        now: chrono::DateTime<chrono::Utc>,
    ) -> FinalizedRound {
        v.finalized = true;
        v.status = if approved {
            ValidationStatus::Approved
        } else {
            ValidationStatus::Rejected
        };
        v.finalized_at = Some(now);

        let winning = if approved {
            VoteChoice::Approve
        } else {
            VoteChoice::Reject
        };
        let mut winners = Vec::new();
        for vote in v.votes.values_mut() {
            if vote.choice == winning {
                vote.reward_claimed = true;
                winners.push(vote.voter);
            }
        }

        info!(
            "Validation finalized for gig {}: {} ({} for / {} against)",
            v.gig_id, v.status, v.votes_for, v.votes_against
        );
        FinalizedRound {
            gig_id: v.gig_id,
            approved,
            winners,
            reward_pool: v.reward_pool,
        }
    }

    /// Even split of the reward pool across winning-side voters; the
    /// remainder stays in the pool account. A failed payout leg is logged
    /// and skipped rather than unwinding the finalization.
    async fn distribute_rewards(&self, round: &FinalizedRound) {
        if round.winners.is_empty() || round.reward_pool.is_zero() {
            return;
        }
        let (share, remainder) = match round.reward_pool.split_even(round.winners.len() as u128) {
            Ok(split) => split,
            Err(err) => {
                warn!("Reward split failed for gig {}: {err}", round.gig_id);
                return;
            }
        };
        if share.is_zero() {
            return;
        }
        for winner in &round.winners {
            if let Err(err) = self
                .wallet
                .transfer(
                    &self.config.bond_token,
                    &self.config.platform_sink,
                    winner,
                    share,
                )
                .await
            {
                warn!("Reward payout to {winner} failed for gig {}: {err}", round.gig_id);
            }
        }
        info!(
            "Rewards paid for gig {}: {share} x {} voters, {remainder} retained",
            round.gig_id,
            round.winners.len()
        );
    }
}

#[async_trait]
impl ConsensusQuery for SwarmCoordinator {
    async fn aggregate_for_gig(&self, gig_id: &GigId) -> Result<VoteAggregate> {
        self.aggregate_votes(*gig_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use swarmpay_types::{ManualClock, TokenId};
    use swarmpay_wallet::InMemoryWallet;

    struct FixedDirectory(Vec<(AgentId, u8)>);

    #[async_trait]
    impl ValidatorDirectory for FixedDirectory {
        async fn eligible_validators(&self) -> Result<Vec<(AgentId, u8)>> {
            Ok(self.0.clone())
        }
    }

    /// Stalls the directory lookup so overlapping initiations genuinely
    /// race through the round-creation path
    struct StallingDirectory(Vec<(AgentId, u8)>);

    #[async_trait]
    impl ValidatorDirectory for StallingDirectory {
        async fn eligible_validators(&self) -> Result<Vec<(AgentId, u8)>> {
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct CountingHook {
        calls: AtomicUsize,
        last_approved: AtomicUsize,
    }

    #[async_trait]
    impl SettlementHook for CountingHook {
        async fn on_finalized(&self, _gig_id: GigId, approved: bool) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_approved
                .store(approved as usize, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        coordinator: SwarmCoordinator,
        hook: Arc<CountingHook>,
        wallet: Arc<InMemoryWallet>,
        clock: ManualClock,
        config: CoreConfig,
        validators: Vec<AgentId>,
    }

    fn harness() -> Harness {
        // Seven eligible agents so a five-seat committee has spares
        let validators: Vec<AgentId> = (0..7).map(|_| AgentId::new()).collect();
        let scored: Vec<(AgentId, u8)> = validators
            .iter()
            .enumerate()
            .map(|(i, a)| (*a, 90 - i as u8))
            .collect();
        harness_with(scored, validators)
    }

    fn harness_with(scored: Vec<(AgentId, u8)>, validators: Vec<AgentId>) -> Harness {
        let config = CoreConfig::new(AgentId::new(), AgentId::new());
        let hook = Arc::new(CountingHook::default());
        let wallet = Arc::new(InMemoryWallet::new());
        let clock = ManualClock::starting_at(Utc::now());
        wallet.set_balance(config.platform_sink, TokenId::usdc(), Amount::new(10_000));

        let coordinator = SwarmCoordinator::new(
            config.clone(),
            Arc::new(FixedDirectory(scored)),
            hook.clone(),
            wallet.clone(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        Harness {
            coordinator,
            hook,
            wallet,
            clock,
            config,
            validators,
        }
    }

    async fn open_round(h: &Harness, gig: GigId) -> Validation {
        h.coordinator
            .initiate_validation(gig, AgentId::new(), AgentId::new(), Amount::new(10_000))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn committee_is_top_scorers_excluding_parties() {
        let h = harness();
        let poster = h.validators[0];
        let assignee = h.validators[1];

        let validation = h
            .coordinator
            .initiate_validation(GigId::new(), poster, assignee, Amount::new(10_000))
            .await
            .unwrap();

        assert_eq!(validation.committee.len(), 5);
        assert!(!validation.committee.contains(&poster));
        assert!(!validation.committee.contains(&assignee));
        // 500 bps of 10_000
        assert_eq!(validation.reward_pool, Amount::new(500));
    }

    #[tokio::test]
    async fn too_few_eligible_validators_is_rejected() {
        let validators: Vec<AgentId> = (0..4).map(|_| AgentId::new()).collect();
        let scored = validators.iter().map(|a| (*a, 80)).collect();
        let h = harness_with(scored, validators);

        let result = h
            .coordinator
            .initiate_validation(
                GigId::new(),
                AgentId::new(),
                AgentId::new(),
                Amount::new(1_000),
            )
            .await;
        assert!(matches!(
            result,
            Err(SwarmPayError::InsufficientValidators {
                eligible: 4,
                required: 5,
            })
        ));
    }

    #[tokio::test]
    async fn third_approving_vote_finalizes_exactly_once() {
        let h = harness();
        let gig = GigId::new();
        let validation = open_round(&h, gig).await;
        let committee = validation.committee.clone();

        for voter in committee.iter().take(2) {
            let agg = h
                .coordinator
                .vote(validation.id, *voter, VoteChoice::Approve)
                .await
                .unwrap();
            assert_eq!(agg.status, ValidationStatus::Pending);
            assert_eq!(h.hook.calls.load(Ordering::SeqCst), 0);
        }

        let agg = h
            .coordinator
            .vote(validation.id, committee[2], VoteChoice::Approve)
            .await
            .unwrap();
        assert_eq!(agg.status, ValidationStatus::Approved);
        assert!(agg.approved);
        assert_eq!(h.hook.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.hook.last_approved.load(Ordering::SeqCst), 1);

        // A straggler is refused and changes nothing
        let late = h
            .coordinator
            .vote(validation.id, committee[3], VoteChoice::Reject)
            .await;
        assert!(matches!(late, Err(SwarmPayError::AlreadyFinalized { .. })));
        let v = h.coordinator.validation(&validation.id).unwrap();
        assert_eq!(v.votes_for, 3);
        assert_eq!(v.votes_against, 0);
        assert!(v.counts_are_consistent());
        assert_eq!(h.hook.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejection_threshold_finalizes_rejected() {
        let h = harness();
        let validation = open_round(&h, GigId::new()).await;
        let committee = validation.committee.clone();

        for voter in committee.iter().take(3) {
            h.coordinator
                .vote(validation.id, *voter, VoteChoice::Reject)
                .await
                .unwrap();
        }
        let v = h.coordinator.validation(&validation.id).unwrap();
        assert_eq!(v.status, ValidationStatus::Rejected);
        assert_eq!(h.hook.last_approved.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outsiders_and_repeat_voters_are_refused() {
        let h = harness();
        let validation = open_round(&h, GigId::new()).await;
        let voter = validation.committee[0];

        let outsider = h
            .coordinator
            .vote(validation.id, AgentId::new(), VoteChoice::Approve)
            .await;
        assert!(matches!(
            outsider,
            Err(SwarmPayError::NotSelectedValidator { .. })
        ));

        h.coordinator
            .vote(validation.id, voter, VoteChoice::Approve)
            .await
            .unwrap();
        let repeat = h
            .coordinator
            .vote(validation.id, voter, VoteChoice::Reject)
            .await;
        assert!(matches!(repeat, Err(SwarmPayError::AlreadyVoted { .. })));

        let v = h.coordinator.validation(&validation.id).unwrap();
        assert_eq!((v.votes_for, v.votes_against), (1, 0));
    }

    #[tokio::test]
    async fn overdue_round_expires_lazily() {
        let h = harness();
        let gig = GigId::new();
        let validation = open_round(&h, gig).await;

        h.clock.advance(Duration::days(7) + Duration::seconds(1));
        let result = h
            .coordinator
            .vote(validation.id, validation.committee[0], VoteChoice::Approve)
            .await;
        assert!(matches!(result, Err(SwarmPayError::ValidationExpired { .. })));

        let agg = h.coordinator.aggregate_votes(gig).unwrap();
        assert_eq!(agg.status, ValidationStatus::Expired);
        assert!(!agg.approved);
        assert_eq!(h.hook.calls.load(Ordering::SeqCst), 0);

        // An expired round may be superseded
        let replacement = open_round(&h, gig).await;
        assert_eq!(replacement.status, ValidationStatus::Pending);
    }

    #[tokio::test]
    async fn second_round_for_a_live_gig_is_refused() {
        let h = harness();
        let gig = GigId::new();
        open_round(&h, gig).await;

        let result = h
            .coordinator
            .initiate_validation(gig, AgentId::new(), AgentId::new(), Amount::new(1_000))
            .await;
        assert!(matches!(result, Err(SwarmPayError::WrongState { .. })));
    }

    #[tokio::test]
    async fn rewards_split_evenly_among_winners_only() {
        let h = harness();
        let validation = open_round(&h, GigId::new()).await;
        let committee = validation.committee.clone();

        // Two losing rejects, then three winning approves
        h.coordinator
            .vote(validation.id, committee[3], VoteChoice::Reject)
            .await
            .unwrap();
        h.coordinator
            .vote(validation.id, committee[4], VoteChoice::Reject)
            .await
            .unwrap();
        for voter in committee.iter().take(3) {
            h.coordinator
                .vote(validation.id, *voter, VoteChoice::Approve)
                .await
                .unwrap();
        }

        // Pool 500 over 3 winners: 166 each, 2 retained by the sink
        for voter in committee.iter().take(3) {
            assert_eq!(
                h.wallet.balance(&TokenId::usdc(), voter).await,
                Amount::new(166)
            );
        }
        for voter in committee.iter().skip(3) {
            assert_eq!(
                h.wallet.balance(&TokenId::usdc(), voter).await,
                Amount::zero()
            );
        }
        assert_eq!(
            h.wallet.balance(&TokenId::usdc(), &h.config.platform_sink).await,
            Amount::new(10_000 - 498)
        );
        let v = h.coordinator.validation(&validation.id).unwrap();
        for vote in v.votes.values() {
            assert_eq!(vote.reward_claimed, vote.choice == VoteChoice::Approve);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_initiations_open_a_single_round() {
        let validators: Vec<AgentId> = (0..7).map(|_| AgentId::new()).collect();
        let scored: Vec<(AgentId, u8)> = validators.iter().map(|a| (*a, 80)).collect();
        let config = CoreConfig::new(AgentId::new(), AgentId::new());
        let hook = Arc::new(CountingHook::default());
        let wallet = Arc::new(InMemoryWallet::new());
        wallet.set_balance(config.platform_sink, TokenId::usdc(), Amount::new(10_000));
        let coordinator = Arc::new(
            SwarmCoordinator::new(
                config.clone(),
                Arc::new(StallingDirectory(scored)),
                hook.clone(),
                wallet.clone(),
                Arc::new(ManualClock::starting_at(Utc::now())),
            )
            .unwrap(),
        );

        let gig = GigId::new();
        let mut handles = Vec::new();
        for _ in 0..2 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .initiate_validation(gig, AgentId::new(), AgentId::new(), Amount::new(10_000))
                    .await
            }));
        }
        let mut opened = Vec::new();
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(validation) => opened.push(validation),
                Err(SwarmPayError::WrongState { .. }) => refused += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(opened.len(), 1);
        assert_eq!(refused, 1);
        assert_eq!(
            coordinator.validation_for_gig(&gig).unwrap().id,
            opened[0].id
        );

        // The surviving round pays exactly one reward pool
        for voter in opened[0].committee.iter().take(3) {
            coordinator
                .vote(opened[0].id, *voter, VoteChoice::Approve)
                .await
                .unwrap();
        }
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            wallet.balance(&TokenId::usdc(), &config.platform_sink).await,
            Amount::new(10_000 - 498)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_votes_finalize_exactly_once() {
        let h = harness();
        let validation = open_round(&h, GigId::new()).await;
        let coordinator = Arc::new(h.coordinator);

        let mut handles = Vec::new();
        for voter in validation.committee.clone() {
            let coordinator = coordinator.clone();
            let id = validation.id;
            handles.push(tokio::spawn(async move {
                coordinator.vote(id, voter, VoteChoice::Approve).await
            }));
        }

        let mut accepted = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(SwarmPayError::AlreadyFinalized { .. }) => refused += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted + refused, 5);
        assert!(accepted >= 3);
        assert_eq!(h.hook.calls.load(Ordering::SeqCst), 1);
        let v = coordinator.validation(&validation.id).unwrap();
        assert_eq!(v.status, ValidationStatus::Approved);
        assert!(v.finalized);
        assert_eq!(v.votes_for, accepted);
        assert!(v.counts_are_consistent());
    }
}
