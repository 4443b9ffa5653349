//! SwarmPay Reputation - score fusion and risk scoring
//!
//! Two pure calculators plus a small stateful store:
//!
//! - [`fusion`]: blends a verified on-chain score with social karma into a
//!   0-100 fused score, maps it to a tier, and answers hireability
//! - [`risk`]: derives a 0-100 risk index and trend from an agent's event
//!   history, with a clean-streak discount
//! - [`book`]: per-agent profiles with an oracle-update cooldown and the
//!   reputation event history
//!
//! Both calculators are deterministic and side-effect-free so callers can
//! preview a score before committing anything.

pub mod book;
pub mod fusion;
pub mod risk;

pub use book::{ReputationBook, ReputationProfile};
pub use fusion::{
    assess_hireability, compute_fused_score, effective_score, FusionInputs, HireabilityVerdict,
    Tier, INACTIVITY_GRACE_DAYS,
};
pub use risk::{assess_risk, compute_risk_index, trend, RiskAssessment, RiskInputs, RiskLevel, RiskTrend};
