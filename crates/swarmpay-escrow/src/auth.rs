//! Authorization predicates for escrow operations
//!
//! Kept as free functions so the rules are testable without a ledger.

use swarmpay_types::{AgentId, CoreConfig, Escrow};

/// Release pays the payee; only the depositor (accepting the work) or the
/// platform administrator may trigger it.
pub fn can_release(caller: &AgentId, escrow: &Escrow, config: &CoreConfig) -> bool {
    caller == &escrow.depositor || caller == &config.platform_admin
}

/// Refund returns funds to the depositor; only the depositor or the
/// platform administrator may trigger it.
pub fn can_refund(caller: &AgentId, escrow: &Escrow, config: &CoreConfig) -> bool {
    caller == &escrow.depositor || caller == &config.platform_admin
}

/// Either party may freeze the escrow by opening a dispute.
pub fn can_dispute(caller: &AgentId, escrow: &Escrow) -> bool {
    caller == &escrow.depositor || caller == &escrow.payee
}

/// Disputes are resolved by the platform administrator alone.
pub fn can_resolve_dispute(caller: &AgentId, config: &CoreConfig) -> bool {
    caller == &config.platform_admin
}

/// A consensus-backed release carries its own proof of approval, so either
/// party (or the administrator) may trigger it.
pub fn can_release_on_consensus(caller: &AgentId, escrow: &Escrow, config: &CoreConfig) -> bool {
    can_dispute(caller, escrow) || caller == &config.platform_admin
}
