//! SwarmPay Types - Canonical domain types for agent work settlement
//!
//! This crate contains all foundational types for SwarmPay with zero
//! dependencies on other swarmpay crates. It defines the type system for:
//!
//! - Identity types (AgentId, GigId, EscrowId, ValidationId, ...)
//! - Token-denominated amounts with checked arithmetic
//! - Escrow, bond, validation and vote records
//! - Reputation and bond audit events
//! - The error taxonomy and the injected core configuration
//!
//! # Architectural Invariants
//!
//! These types support the core SwarmPay invariants:
//!
//! 1. `available + locked == total` for every bond account
//! 2. At most one escrow per gig; transitions follow the state machine
//! 3. A validation finalizes at most once
//! 4. Configuration is injected at construction, never ambient

pub mod amount;
pub mod bond;
pub mod clock;
pub mod config;
pub mod error;
pub mod escrow;
pub mod events;
pub mod identity;
pub mod validation;

pub use amount::*;
pub use bond::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use escrow::*;
pub use events::*;
pub use identity::*;
pub use validation::*;

/// Version of the SwarmPay types schema
pub const TYPES_VERSION: &str = "0.1.0";
