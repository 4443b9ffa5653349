//! SwarmPay Wallet - opaque custody transfer capability
//!
//! The core never owns balances; it drives an external custody provider
//! through the narrow [`WalletProvider`] seam. Multi-leg payouts that fail
//! partway are rolled back by reversing the already-executed legs, so the
//! internal state machine and the money always commit together.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{info, warn};

use swarmpay_types::{AgentId, Amount, Result, SwarmPayError, TokenId, TransferId};

/// A completed transfer, kept so it can be reversed
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub id: TransferId,
    pub token: TokenId,
    pub from: AgentId,
    pub to: AgentId,
    pub amount: Amount,
}

/// Custody transfer capability
///
/// `transfer` either fully completes or leaves both balances untouched.
/// `reverse` compensates a previously executed transfer; callers use it to
/// unwind the earlier legs of a multi-leg payout when a later leg fails.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn transfer(
        &self,
        token: &TokenId,
        from: &AgentId,
        to: &AgentId,
        amount: Amount,
    ) -> Result<TransferId>;

    async fn reverse(&self, transfer_id: &TransferId) -> Result<()>;

    async fn balance(&self, token: &TokenId, account: &AgentId) -> Amount;
}

/// In-memory custody provider for tests and local runs
pub struct InMemoryWallet {
    balances: DashMap<(AgentId, TokenId), Amount>,
    transfers: DashMap<TransferId, TransferRecord>,
    /// Accounts for which incoming transfers fail; failure-injection for
    /// atomicity tests
    denied_recipients: DashMap<AgentId, ()>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            transfers: DashMap::new(),
            denied_recipients: DashMap::new(),
        }
    }

    pub fn set_balance(&self, account: AgentId, token: TokenId, amount: Amount) {
        self.balances.insert((account, token), amount);
    }

    /// Make every transfer *to* this account fail until allowed again
    pub fn deny_recipient(&self, account: AgentId) {
        self.denied_recipients.insert(account, ());
    }

    pub fn allow_recipient(&self, account: &AgentId) {
        self.denied_recipients.remove(account);
    }

    fn credit(&self, account: &AgentId, token: &TokenId, amount: Amount) -> Result<()> {
        let mut entry = self
            .balances
            .entry((*account, token.clone()))
            .or_insert(Amount::zero());
        *entry = entry.checked_add(amount)?;
        Ok(())
    }

    fn debit(&self, account: &AgentId, token: &TokenId, amount: Amount) -> Result<()> {
        let mut entry = self
            .balances
            .entry((*account, token.clone()))
            .or_insert(Amount::zero());
        if *entry < amount {
            return Err(SwarmPayError::InsufficientFunds {
                account: account.to_string(),
                requested: amount.0,
                available: entry.0,
            });
        }
        *entry = entry.checked_sub(amount)?;
        Ok(())
    }
}

impl Default for InMemoryWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for InMemoryWallet {
    async fn transfer(
        &self,
        token: &TokenId,
        from: &AgentId,
        to: &AgentId,
        amount: Amount,
    ) -> Result<TransferId> {
        if self.denied_recipients.contains_key(to) {
            return Err(SwarmPayError::TransferFailed {
                reason: format!("recipient {to} is not accepting transfers"),
            });
        }

        self.debit(from, token, amount)?;
        if let Err(e) = self.credit(to, token, amount) {
            // Undo the debit so a failed transfer moves nothing
            self.credit(from, token, amount)?;
            return Err(e);
        }

        let record = TransferRecord {
            id: TransferId::new(),
            token: token.clone(),
            from: *from,
            to: *to,
            amount,
        };
        let id = record.id;
        self.transfers.insert(id, record);
        info!("Transfer executed: {} {} from {} to {}", amount, token, from, to);
        Ok(id)
    }

    async fn reverse(&self, transfer_id: &TransferId) -> Result<()> {
        let (_, record) =
            self.transfers
                .remove(transfer_id)
                .ok_or_else(|| SwarmPayError::TransferFailed {
                    reason: format!("unknown transfer {transfer_id}"),
                })?;
        self.debit(&record.to, &record.token, record.amount)?;
        self.credit(&record.from, &record.token, record.amount)?;
        warn!("Transfer reversed: {}", transfer_id);
        Ok(())
    }

    async fn balance(&self, token: &TokenId, account: &AgentId) -> Amount {
        self.balances
            .get(&(*account, token.clone()))
            .map(|a| *a)
            .unwrap_or(Amount::zero())
    }
}
