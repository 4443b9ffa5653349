//! Error types for SwarmPay
//!
//! Every failure is explicit and terminal: the core never retries on the
//! caller's behalf. Each variant maps onto one of the taxonomy categories
//! (validation, policy, authorization, state conflict, temporal,
//! consensus, transfer) via [`SwarmPayError::category`].

use thiserror::Error;

/// Result type for SwarmPay operations
pub type Result<T> = std::result::Result<T, SwarmPayError>;

/// Coarse error taxonomy, used by API consumers to pick a response class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or invalid input
    Validation,
    /// An economic policy gate rejected the operation
    Policy,
    /// The caller may not perform the requested operation
    Authorization,
    /// Wrong lifecycle state, or an already-finalized entity
    StateConflict,
    /// Cooldown not elapsed, or timeout not yet reached
    Temporal,
    /// Votes below threshold, or validation expired
    Consensus,
    /// The external custody transfer failed; no state was changed
    Transfer,
}

/// SwarmPay error types
#[derive(Debug, Clone, Error)]
pub enum SwarmPayError {
    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Amount must be non-zero
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Arithmetic overflow or underflow during checked math
    #[error("Arithmetic overflow during checked operation")]
    ArithmeticOverflow,

    /// Score input outside its documented range
    #[error("Score input {field} = {value} outside [0, {max}]")]
    ScoreOutOfRange { field: &'static str, value: u32, max: u32 },

    /// No escrow exists for the gig
    #[error("No escrow exists for gig {gig_id}")]
    EscrowNotFound { gig_id: String },

    /// An escrow already exists for the gig
    #[error("Escrow already exists for gig {gig_id}")]
    EscrowAlreadyExists { gig_id: String },

    /// No bond account exists for the agent
    #[error("No bond account exists for agent {agent_id}")]
    BondAccountNotFound { agent_id: String },

    /// No bond lock exists for the gig
    #[error("No bond lock exists for gig {gig_id}")]
    GigNotLocked { gig_id: String },

    /// No validation exists with the given id
    #[error("Validation {validation_id} not found")]
    ValidationNotFound { validation_id: String },

    /// No reputation profile exists for the agent
    #[error("No reputation profile exists for agent {agent_id}")]
    ProfileNotFound { agent_id: String },

    // ========================================================================
    // Policy Violations
    // ========================================================================

    /// Deposit below the configured minimum
    #[error("Deposit {amount} below minimum {minimum}")]
    BelowMinimumDeposit { amount: u128, minimum: u128 },

    /// Withdrawal exceeds the available (unlocked) bond
    #[error("Withdrawal {requested} exceeds available bond {available}")]
    InsufficientAvailableBond { requested: u128, available: u128 },

    /// Lock amount exceeds the available bond
    #[error("Lock of {requested} exceeds available bond {available}")]
    InsufficientBond { requested: u128, available: u128 },

    /// Token is not on the configured allow-list
    #[error("Token {token} is not approved for escrow")]
    TokenNotApproved { token: String },

    /// Fee rate above the configured cap
    #[error("Fee rate {bps} bps exceeds cap {cap_bps} bps")]
    FeeTooHigh { bps: u32, cap_bps: u32 },

    /// Fewer eligible validators than the committee requires
    #[error("Only {eligible} eligible validators, committee needs {required}")]
    InsufficientValidators { eligible: usize, required: usize },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    /// The caller is not permitted to perform this operation
    #[error("Agent {caller} is not authorized to {operation}")]
    NotAuthorized { caller: String, operation: &'static str },

    /// The voter is not on the validation committee
    #[error("Agent {voter} is not a selected validator for validation {validation_id}")]
    NotSelectedValidator { voter: String, validation_id: String },

    // ========================================================================
    // State Conflicts
    // ========================================================================

    /// Operation attempted from the wrong lifecycle state
    #[error("Cannot {operation} from state {state}")]
    WrongState { operation: &'static str, state: String },

    /// The validation has already finalized; vote not counted
    #[error("Validation {validation_id} is already finalized")]
    AlreadyFinalized { validation_id: String },

    /// One vote per (validation, voter)
    #[error("Agent {voter} has already voted in validation {validation_id}")]
    AlreadyVoted { voter: String, validation_id: String },

    /// A single open lock record per gig
    #[error("Gig {gig_id} already has an open bond lock")]
    GigAlreadyLocked { gig_id: String },

    // ========================================================================
    // Temporal Errors
    // ========================================================================

    /// Timeout refund attempted before the deadline
    #[error("Timeout not elapsed: refundable at {deadline}")]
    TimeoutNotElapsed { deadline: String },

    /// Oracle/reputation update arrived inside the cooldown window
    #[error("Update cooldown not elapsed: next update allowed at {next_allowed_at}")]
    CooldownNotElapsed { next_allowed_at: String },

    // ========================================================================
    // Consensus Errors
    // ========================================================================

    /// Consensus-gated release attempted without an approving quorum
    #[error("Consensus not reached for gig {gig_id}: {votes_for} of {threshold} approving votes")]
    ConsensusNotReached {
        gig_id: String,
        votes_for: u32,
        threshold: u32,
    },

    /// The validation round expired before reaching a quorum
    #[error("Validation for gig {gig_id} has expired")]
    ValidationExpired { gig_id: String },

    // ========================================================================
    // Transfer Errors
    // ========================================================================

    /// The external custody transfer failed; all prior state is unchanged
    #[error("Custody transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// Insufficient custody balance
    #[error("Insufficient funds in account {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: String,
        requested: u128,
        available: u128,
    },
}

impl SwarmPayError {
    /// The taxonomy category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAmount { .. }
            | Self::ArithmeticOverflow
            | Self::ScoreOutOfRange { .. }
            | Self::EscrowNotFound { .. }
            | Self::EscrowAlreadyExists { .. }
            | Self::BondAccountNotFound { .. }
            | Self::GigNotLocked { .. }
            | Self::ValidationNotFound { .. }
            | Self::ProfileNotFound { .. } => ErrorCategory::Validation,

            Self::BelowMinimumDeposit { .. }
            | Self::InsufficientAvailableBond { .. }
            | Self::InsufficientBond { .. }
            | Self::TokenNotApproved { .. }
            | Self::FeeTooHigh { .. }
            | Self::InsufficientValidators { .. } => ErrorCategory::Policy,

            Self::NotAuthorized { .. } | Self::NotSelectedValidator { .. } => {
                ErrorCategory::Authorization
            }

            Self::WrongState { .. }
            | Self::AlreadyFinalized { .. }
            | Self::AlreadyVoted { .. }
            | Self::GigAlreadyLocked { .. } => ErrorCategory::StateConflict,

            Self::TimeoutNotElapsed { .. } | Self::CooldownNotElapsed { .. } => {
                ErrorCategory::Temporal
            }

            Self::ConsensusNotReached { .. } | Self::ValidationExpired { .. } => {
                ErrorCategory::Consensus
            }

            Self::TransferFailed { .. } | Self::InsufficientFunds { .. } => {
                ErrorCategory::Transfer
            }
        }
    }

    /// Stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            Self::ScoreOutOfRange { .. } => "SCORE_OUT_OF_RANGE",
            Self::EscrowNotFound { .. } => "ESCROW_NOT_FOUND",
            Self::EscrowAlreadyExists { .. } => "ESCROW_ALREADY_EXISTS",
            Self::BondAccountNotFound { .. } => "BOND_ACCOUNT_NOT_FOUND",
            Self::GigNotLocked { .. } => "GIG_NOT_LOCKED",
            Self::ValidationNotFound { .. } => "VALIDATION_NOT_FOUND",
            Self::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            Self::BelowMinimumDeposit { .. } => "BELOW_MINIMUM_DEPOSIT",
            Self::InsufficientAvailableBond { .. } => "INSUFFICIENT_AVAILABLE_BOND",
            Self::InsufficientBond { .. } => "INSUFFICIENT_BOND",
            Self::TokenNotApproved { .. } => "TOKEN_NOT_APPROVED",
            Self::FeeTooHigh { .. } => "FEE_TOO_HIGH",
            Self::InsufficientValidators { .. } => "INSUFFICIENT_VALIDATORS",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::NotSelectedValidator { .. } => "NOT_SELECTED_VALIDATOR",
            Self::WrongState { .. } => "WRONG_STATE",
            Self::AlreadyFinalized { .. } => "ALREADY_FINALIZED",
            Self::AlreadyVoted { .. } => "ALREADY_VOTED",
            Self::GigAlreadyLocked { .. } => "GIG_ALREADY_LOCKED",
            Self::TimeoutNotElapsed { .. } => "TIMEOUT_NOT_ELAPSED",
            Self::CooldownNotElapsed { .. } => "COOLDOWN_NOT_ELAPSED",
            Self::ConsensusNotReached { .. } => "CONSENSUS_NOT_REACHED",
            Self::ValidationExpired { .. } => "VALIDATION_EXPIRED",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_the_taxonomy() {
        let err = SwarmPayError::BelowMinimumDeposit {
            amount: 10,
            minimum: 100,
        };
        assert_eq!(err.category(), ErrorCategory::Policy);

        let err = SwarmPayError::AlreadyFinalized {
            validation_id: "v".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::StateConflict);

        let err = SwarmPayError::TimeoutNotElapsed {
            deadline: "t".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Temporal);
    }

    #[test]
    fn error_codes_are_stable() {
        let err = SwarmPayError::TransferFailed {
            reason: "down".to_string(),
        };
        assert_eq!(err.error_code(), "TRANSFER_FAILED");
        assert_eq!(err.category(), ErrorCategory::Transfer);
    }
}
