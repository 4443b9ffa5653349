//! Core configuration
//!
//! All economic knobs (fee rate, slash caps, committee sizing, timeouts)
//! live in one explicit struct injected at construction. There is no
//! ambient configuration.

use crate::{AgentId, Amount, Result, SwarmPayError, TokenId};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Hard cap on the punitive slash fraction (20%)
pub const SLASH_BPS_CAP: u32 = 2_000;

/// Risk-level bucket boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBounds {
    /// Risk index at or below this is low risk
    pub low_max: u8,
    /// Risk index at or below this (and above low) is medium risk
    pub medium_max: u8,
}

impl Default for RiskBounds {
    fn default() -> Self {
        Self {
            low_max: 25,
            medium_max: 60,
        }
    }
}

/// Configuration for the SwarmPay core, injected at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Platform fee on escrow release, in basis points
    pub fee_bps: u32,
    /// Upper bound on `fee_bps`
    pub max_fee_bps: u32,
    /// Punitive slash fraction, in basis points (bounded by [`SLASH_BPS_CAP`])
    pub slash_bps: u32,
    /// Minimum bond deposit
    pub min_deposit: Amount,
    /// Performance score (0-100) below which locking bond triggers the
    /// punitive auto-slash gate instead of a lock
    pub min_performance_score: u8,
    /// Number of validators selected per validation round
    pub committee_size: usize,
    /// Approving (or rejecting) votes needed to finalize
    pub vote_threshold: u32,
    /// How long a validation round may stay open
    pub validation_expiry: Duration,
    /// Fraction of the gig budget funding the validator reward pool, bps
    pub validator_reward_bps: u32,
    /// Escrow timeout after which anyone may trigger a refund
    pub escrow_timeout: Duration,
    /// Minimum interval between reputation oracle updates per agent
    pub reputation_update_cooldown: Duration,
    /// Risk-level bucket boundaries
    pub risk_bounds: RiskBounds,
    /// Tokens accepted for escrow
    pub approved_tokens: HashSet<TokenId>,
    /// Token in which bond collateral is denominated
    pub bond_token: TokenId,
    /// The platform administrator account
    pub platform_admin: AgentId,
    /// Destination for fees and slashed collateral
    pub platform_sink: AgentId,
    /// Custody account holding bonded collateral
    pub bond_vault: AgentId,
    /// Custody account holding escrowed funds
    pub escrow_vault: AgentId,
}

impl CoreConfig {
    /// A baseline configuration; callers override fields as needed
    pub fn new(platform_admin: AgentId, platform_sink: AgentId) -> Self {
        Self {
            fee_bps: 250,
            max_fee_bps: 1_000,
            slash_bps: 2_000,
            min_deposit: Amount::new(100),
            min_performance_score: 40,
            committee_size: 5,
            vote_threshold: 3,
            validation_expiry: Duration::days(7),
            validator_reward_bps: 500,
            escrow_timeout: Duration::days(90),
            reputation_update_cooldown: Duration::hours(1),
            risk_bounds: RiskBounds::default(),
            approved_tokens: HashSet::from([TokenId::usdc()]),
            bond_token: TokenId::usdc(),
            platform_admin,
            platform_sink,
            bond_vault: AgentId::new(),
            escrow_vault: AgentId::new(),
        }
    }

    /// Validate the configuration; components call this at construction
    pub fn validate(&self) -> Result<()> {
        if self.fee_bps > self.max_fee_bps {
            return Err(SwarmPayError::FeeTooHigh {
                bps: self.fee_bps,
                cap_bps: self.max_fee_bps,
            });
        }
        if self.slash_bps > SLASH_BPS_CAP {
            return Err(SwarmPayError::FeeTooHigh {
                bps: self.slash_bps,
                cap_bps: SLASH_BPS_CAP,
            });
        }
        if self.vote_threshold as usize > self.committee_size {
            return Err(SwarmPayError::InsufficientValidators {
                eligible: self.committee_size,
                required: self.vote_threshold as usize,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CoreConfig {
        CoreConfig::new(AgentId::new(), AgentId::new())
    }

    #[test]
    fn default_config_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn fee_above_cap_is_rejected() {
        let mut config = base();
        config.fee_bps = 1_500;
        assert!(matches!(
            config.validate(),
            Err(SwarmPayError::FeeTooHigh { .. })
        ));
    }

    #[test]
    fn slash_fraction_is_hard_capped() {
        let mut config = base();
        config.slash_bps = SLASH_BPS_CAP + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_cannot_exceed_committee() {
        let mut config = base();
        config.vote_threshold = 6;
        config.committee_size = 5;
        assert!(config.validate().is_err());
    }
}
