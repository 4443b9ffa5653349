//! Risk scoring
//!
//! The risk index is a capped sum of history components minus a
//! clean-streak discount, clamped to 0-100:
//!
//! | Component | Cap |
//! |---|---|
//! | slashes | 45 |
//! | failed gigs | 25 |
//! | disputes | 40 |
//! | inactivity | 10 |
//! | bond depletion | 20 |
//!
//! The clean-streak bonus is 10% of the raw sum once the agent has gone
//! 30 days without a slash or failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swarmpay_types::{Amount, RiskBounds};

const SLASH_CAP: u32 = 45;
const FAILED_GIG_CAP: u32 = 25;
const DISPUTE_CAP: u32 = 40;
const INACTIVITY_CAP: u32 = 10;
const BOND_DEPLETION_CAP: u32 = 20;

/// Days of clean history before the discount applies
const CLEAN_STREAK_MIN_DAYS: i64 = 30;

/// Inactivity grace period before the component starts accruing
const INACTIVITY_GRACE_DAYS: i64 = 30;

/// Tolerance inside which two indices count as the same trend
const TREND_TOLERANCE: u8 = 3;

/// An agent's event history, as supplied by the directory and ledgers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskInputs {
    pub slash_count: u32,
    pub failed_gigs: u32,
    pub open_disputes: u32,
    pub disputes_resolved_against: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub bond_total: Amount,
    pub bond_available: Amount,
    /// Days since the last slash or failed gig
    pub clean_streak_days: i64,
}

/// Risk bucket driving the fee-rate multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_index(index: u8, bounds: &RiskBounds) -> Self {
        if index <= bounds.low_max {
            Self::Low
        } else if index <= bounds.medium_max {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Fee-rate multiplier; below 1 for low risk
    pub fn fee_multiplier(&self) -> f64 {
        match self {
            Self::Low => 0.9,
            Self::Medium => 1.0,
            Self::High => 1.25,
        }
    }
}

/// Direction of the index relative to a prior sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTrend {
    Improving,
    Stable,
    Worsening,
}

/// The composed risk answer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub index: u8,
    pub level: RiskLevel,
    pub fee_multiplier: f64,
}

fn slash_component(inputs: &RiskInputs) -> u32 {
    (inputs.slash_count * 15).min(SLASH_CAP)
}

fn failed_gig_component(inputs: &RiskInputs) -> u32 {
    (inputs.failed_gigs * 5).min(FAILED_GIG_CAP)
}

fn dispute_component(inputs: &RiskInputs) -> u32 {
    (inputs.open_disputes * 10 + inputs.disputes_resolved_against * 5).min(DISPUTE_CAP)
}

fn inactivity_component(inputs: &RiskInputs, now: DateTime<Utc>) -> u32 {
    let days_inactive = match inputs.last_activity_at {
        Some(at) => (now - at).num_days(),
        None => return INACTIVITY_CAP,
    };
    if days_inactive <= INACTIVITY_GRACE_DAYS {
        return 0;
    }
    // One point per week past the grace month
    (((days_inactive - INACTIVITY_GRACE_DAYS) / 7) as u32).min(INACTIVITY_CAP)
}

fn bond_depletion_component(inputs: &RiskInputs) -> u32 {
    if inputs.bond_total.is_zero() {
        return BOND_DEPLETION_CAP;
    }
    let depleted = inputs.bond_total.0.saturating_sub(inputs.bond_available.0);
    ((depleted * BOND_DEPLETION_CAP as u128 / inputs.bond_total.0) as u32).min(BOND_DEPLETION_CAP)
}

/// Compute the 0-100 risk index from an agent's history
pub fn compute_risk_index(inputs: &RiskInputs, now: DateTime<Utc>) -> u8 {
    let raw = slash_component(inputs)
        + failed_gig_component(inputs)
        + dispute_component(inputs)
        + inactivity_component(inputs, now)
        + bond_depletion_component(inputs);

    let bonus = if inputs.clean_streak_days >= CLEAN_STREAK_MIN_DAYS {
        raw / 10
    } else {
        0
    };

    raw.saturating_sub(bonus).min(100) as u8
}

/// Compare against a prior sample of the index
pub fn trend(current: u8, previous: u8) -> RiskTrend {
    let delta = current.abs_diff(previous);
    if delta <= TREND_TOLERANCE {
        RiskTrend::Stable
    } else if current < previous {
        RiskTrend::Improving
    } else {
        RiskTrend::Worsening
    }
}

/// Full assessment: index, level bucket and fee multiplier
pub fn assess_risk(inputs: &RiskInputs, now: DateTime<Utc>, bounds: &RiskBounds) -> RiskAssessment {
    let index = compute_risk_index(inputs, now);
    let level = RiskLevel::from_index(index, bounds);
    RiskAssessment {
        index,
        level,
        fee_multiplier: level.fee_multiplier(),
    }
}
