//! Full-stack flows: escrow + bond + consensus + settlement wired the way
//! a deployment wires them, with the in-memory wallet underneath.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use swarmpay_bond::BondLedger;
use swarmpay_consensus::{SwarmCoordinator, ValidatorDirectory};
use swarmpay_escrow::EscrowLedger;
use swarmpay_reputation::{ReputationBook, RiskLevel};
use swarmpay_settlement::SettlementOrchestrator;
use swarmpay_types::{
    AgentId, Amount, BondLockStatus, CoreConfig, EscrowStatus, GigId, ManualClock,
    ReputationEventKind, Result, SettlementOutcome, TokenId, ValidationStatus, VoteChoice,
};
use swarmpay_wallet::{InMemoryWallet, WalletProvider};

struct FixedDirectory(Vec<(AgentId, u8)>);

#[async_trait]
impl ValidatorDirectory for FixedDirectory {
    async fn eligible_validators(&self) -> Result<Vec<(AgentId, u8)>> {
        Ok(self.0.clone())
    }
}

struct Stack {
    config: CoreConfig,
    wallet: Arc<InMemoryWallet>,
    reputation: Arc<ReputationBook>,
    bond: Arc<BondLedger>,
    escrow: Arc<EscrowLedger>,
    orchestrator: Arc<SettlementOrchestrator>,
    coordinator: Arc<SwarmCoordinator>,
    poster: AgentId,
    worker: AgentId,
}

async fn stack() -> Stack {
    let config = CoreConfig::new(AgentId::new(), AgentId::new());
    let wallet = Arc::new(InMemoryWallet::new());
    let clock = Arc::new(ManualClock::starting_at(Utc::now()));

    let poster = AgentId::new();
    let worker = AgentId::new();
    wallet.set_balance(poster, TokenId::usdc(), Amount::new(100_000));
    wallet.set_balance(worker, TokenId::usdc(), Amount::new(10_000));
    wallet.set_balance(config.platform_sink, TokenId::usdc(), Amount::new(10_000));

    let reputation =
        Arc::new(ReputationBook::new(config.clone(), clock.clone()).unwrap());
    // Fused score of 70, comfortably above the performance gate
    reputation
        .record_oracle_update(worker, 890, 4_200)
        .await
        .unwrap();

    let bond = Arc::new(
        BondLedger::new(
            config.clone(),
            wallet.clone(),
            reputation.clone(),
            clock.clone(),
        )
        .unwrap(),
    );
    let escrow =
        Arc::new(EscrowLedger::new(config.clone(), wallet.clone(), clock.clone()).unwrap());
    let orchestrator = Arc::new(
        SettlementOrchestrator::new(
            config.clone(),
            escrow.clone(),
            bond.clone(),
            reputation.clone(),
            clock.clone(),
        )
        .unwrap(),
    );

    let validators: Vec<(AgentId, u8)> = (0..6).map(|i| (AgentId::new(), 80 - i as u8)).collect();
    let coordinator = Arc::new(
        SwarmCoordinator::new(
            config.clone(),
            Arc::new(FixedDirectory(validators)),
            orchestrator.clone(),
            wallet.clone(),
            clock.clone(),
        )
        .unwrap(),
    );

    Stack {
        config,
        wallet,
        reputation,
        bond,
        escrow,
        orchestrator,
        coordinator,
        poster,
        worker,
    }
}

impl Stack {
    /// Bond posted and locked, escrow funded, validation round open
    async fn open_gig(&self, gig: GigId, budget: u128, bond_stake: u128) {
        self.bond
            .deposit(self.worker, Amount::new(1_000))
            .await
            .unwrap();
        self.bond
            .lock_for_gig(self.worker, gig, Amount::new(bond_stake))
            .await
            .unwrap();
        self.escrow
            .create_and_lock(
                self.poster,
                self.worker,
                gig,
                Amount::new(budget),
                TokenId::usdc(),
            )
            .await
            .unwrap();
        self.coordinator
            .initiate_validation(gig, self.poster, self.worker, Amount::new(budget))
            .await
            .unwrap();
    }

    async fn cast_votes(&self, gig: GigId, choice: VoteChoice, count: usize) {
        let validation = self.coordinator.validation_for_gig(&gig).unwrap();
        for voter in validation.committee.iter().take(count) {
            self.coordinator
                .vote(validation.id, *voter, choice)
                .await
                .unwrap();
        }
    }

    async fn balance(&self, account: &AgentId) -> Amount {
        self.wallet.balance(&TokenId::usdc(), account).await
    }
}

#[tokio::test]
async fn approved_work_pays_everyone_their_share() {
    let s = stack().await;
    let gig = GigId::new();
    s.open_gig(gig, 10_000, 300).await;

    s.cast_votes(gig, VoteChoice::Approve, 3).await;

    // Escrow released: payee got 10_000 minus the 250 fee
    assert_eq!(s.escrow.escrow(&gig).unwrap().status, EscrowStatus::Released);
    assert_eq!(
        s.balance(&s.worker).await,
        Amount::new(10_000 - 1_000 + 9_750)
    );
    assert_eq!(s.balance(&s.poster).await, Amount::new(90_000));

    // Sink: +250 fee, -498 paid out as validator rewards (pool 500 / 3)
    assert_eq!(
        s.balance(&s.config.platform_sink).await,
        Amount::new(10_000 + 250 - 498)
    );

    // Bond lock released in full
    let account = s.bond.account(&s.worker).await.unwrap();
    assert_eq!(account.available, Amount::new(1_000));
    assert_eq!(account.locked, Amount::zero());
    assert!(account.is_conserved());
    assert_eq!(s.bond.lock(&gig).await.unwrap().status, BondLockStatus::Unlocked);

    // Reputation event and settlement record in place
    let kinds: Vec<ReputationEventKind> = s
        .reputation
        .events_for(&s.worker)
        .await
        .iter()
        .map(|e| e.kind)
        .collect();
    assert!(kinds.contains(&ReputationEventKind::WorkApproved));
    let record = s.orchestrator.settlement(&gig).unwrap();
    assert_eq!(record.outcome, SettlementOutcome::Approved);
    assert_eq!(record.escrow_status, EscrowStatus::Released);

    let aggregate = s.coordinator.aggregate_votes(gig).unwrap();
    assert_eq!(aggregate.status, ValidationStatus::Approved);
    assert!(aggregate.approved);
}

#[tokio::test]
async fn rejected_work_refunds_and_slashes() {
    let s = stack().await;
    let gig = GigId::new();
    s.open_gig(gig, 10_000, 300).await;

    s.cast_votes(gig, VoteChoice::Reject, 3).await;

    // Full refund, no fee
    assert_eq!(s.escrow.escrow(&gig).unwrap().status, EscrowStatus::Refunded);
    assert_eq!(s.balance(&s.poster).await, Amount::new(100_000));

    // Bond slashed 20% of the 300 lock
    let account = s.bond.account(&s.worker).await.unwrap();
    assert_eq!(account.cumulative_slashed, Amount::new(60));
    assert_eq!(account.total, Amount::new(940));
    assert_eq!(account.locked, Amount::zero());
    assert!(account.is_conserved());

    // Sink: +60 slash, -498 validator rewards
    assert_eq!(
        s.balance(&s.config.platform_sink).await,
        Amount::new(10_000 + 60 - 498)
    );

    let kinds: Vec<ReputationEventKind> = s
        .reputation
        .events_for(&s.worker)
        .await
        .iter()
        .map(|e| e.kind)
        .collect();
    assert!(kinds.contains(&ReputationEventKind::WorkRejected));
    assert_eq!(
        s.orchestrator.settlement(&gig).unwrap().outcome,
        SettlementOutcome::Rejected
    );
}

#[tokio::test]
async fn repeated_settlement_is_a_replay_with_identical_totals() {
    let s = stack().await;
    let gig = GigId::new();
    s.open_gig(gig, 10_000, 300).await;
    s.cast_votes(gig, VoteChoice::Approve, 3).await;

    let account_before = s.bond.account(&s.worker).await.unwrap();
    let worker_before = s.balance(&s.worker).await;
    let sink_before = s.balance(&s.config.platform_sink).await;
    let events_before = s.reputation.events_for(&s.worker).await.len();

    // Retried with both outcomes; the recorded verdict is returned as-is
    for outcome in [SettlementOutcome::Approved, SettlementOutcome::Rejected] {
        let settlement = s.orchestrator.settle(gig, outcome).await.unwrap();
        assert!(settlement.is_replay());
        assert_eq!(settlement.record().outcome, SettlementOutcome::Approved);
    }

    let account_after = s.bond.account(&s.worker).await.unwrap();
    assert_eq!(account_before.total, account_after.total);
    assert_eq!(account_before.available, account_after.available);
    assert_eq!(account_before.cumulative_slashed, account_after.cumulative_slashed);
    assert_eq!(worker_before, s.balance(&s.worker).await);
    assert_eq!(sink_before, s.balance(&s.config.platform_sink).await);
    assert_eq!(s.reputation.events_for(&s.worker).await.len(), events_before);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_triggers_settle_exactly_once() {
    let s = stack().await;
    let gig = GigId::new();
    s.open_gig(gig, 10_000, 300).await;

    // Finalization itself settles once; race two more manual triggers
    s.cast_votes(gig, VoteChoice::Approve, 3).await;
    let a = {
        let orchestrator = s.orchestrator.clone();
        tokio::spawn(async move { orchestrator.settle(gig, SettlementOutcome::Approved).await })
    };
    let b = {
        let orchestrator = s.orchestrator.clone();
        tokio::spawn(async move { orchestrator.settle(gig, SettlementOutcome::Approved).await })
    };
    assert!(a.await.unwrap().unwrap().is_replay());
    assert!(b.await.unwrap().unwrap().is_replay());

    // Payee paid exactly once
    assert_eq!(
        s.balance(&s.worker).await,
        Amount::new(10_000 - 1_000 + 9_750)
    );
}

#[tokio::test]
async fn risk_profile_composes_bond_and_reputation_history() {
    // A rejection leaves a slash and a failed gig in the histories
    let s = stack().await;
    let gig = GigId::new();
    s.open_gig(gig, 10_000, 300).await;
    s.cast_votes(gig, VoteChoice::Reject, 3).await;

    // Slash 15 + failed gig 5 + never-active 10; the bond itself is whole
    let risk = s.orchestrator.risk_profile(&s.worker).await.unwrap();
    assert_eq!(risk.index, 30);
    assert_eq!(risk.level, RiskLevel::Medium);
    assert_eq!(risk.fee_multiplier, 1.0);

    // An approved gig leaves a clean, recently-active profile
    let s = stack().await;
    let gig = GigId::new();
    s.open_gig(gig, 10_000, 300).await;
    s.cast_votes(gig, VoteChoice::Approve, 3).await;

    let risk = s.orchestrator.risk_profile(&s.worker).await.unwrap();
    assert_eq!(risk.index, 0);
    assert_eq!(risk.level, RiskLevel::Low);
    assert!(risk.fee_multiplier < 1.0);
}

#[tokio::test]
async fn disputed_gig_settles_only_through_admin_resolution() {
    let s = stack().await;
    let gig = GigId::new();
    s.open_gig(gig, 10_000, 300).await;
    s.escrow.dispute(s.poster, gig).await.unwrap();
    s.reputation.dispute_opened(s.worker).await;

    // The automatic path refuses a disputed escrow
    let blocked = s.orchestrator.settle(gig, SettlementOutcome::Approved).await;
    assert!(blocked.is_err());
    assert_eq!(s.escrow.escrow(&gig).unwrap().status, EscrowStatus::Disputed);

    let settlement = s
        .orchestrator
        .resolve_disputed(gig, SettlementOutcome::Rejected)
        .await
        .unwrap();
    assert!(!settlement.is_replay());
    assert_eq!(s.escrow.escrow(&gig).unwrap().status, EscrowStatus::Refunded);
    assert_eq!(s.balance(&s.poster).await, Amount::new(100_000));

    // Worker's dispute count cleared, rejection recorded
    let profile = s.reputation.profile(&s.worker).await.unwrap();
    assert_eq!(profile.active_disputes, 0);
    let kinds: Vec<ReputationEventKind> = s
        .reputation
        .events_for(&s.worker)
        .await
        .iter()
        .map(|e| e.kind)
        .collect();
    assert!(kinds.contains(&ReputationEventKind::DisputeResolved));
    assert!(kinds.contains(&ReputationEventKind::WorkRejected));

    // The against-resolution counts into the risk index (slash 15 +
    // failed gig 5 + resolved-against 5 + never-active 10)
    let risk = s.orchestrator.risk_profile(&s.worker).await.unwrap();
    assert_eq!(risk.index, 35);

    // And the replay path holds afterwards
    assert!(s
        .orchestrator
        .resolve_disputed(gig, SettlementOutcome::Approved)
        .await
        .unwrap()
        .is_replay());
}
