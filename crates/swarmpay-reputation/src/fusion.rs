//! Reputation fusion
//!
//! `fused = floor((60 * normalized_on_chain + 40 * normalized_karma) / 100)`
//! with inputs normalized to 0-100 by integer division. All math is integer
//! and truncates toward zero, so `(890, 4200)` fuses to exactly 70.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use swarmpay_types::{Result, SwarmPayError};

/// Upper bound of the verified on-chain score
pub const ON_CHAIN_MAX: u32 = 1_000;

/// Upper bound of the social karma input
pub const SOCIAL_KARMA_MAX: u32 = 10_000;

/// Weight on the on-chain component (out of 100)
const ON_CHAIN_WEIGHT: u32 = 60;

/// Weight on the social component (out of 100)
const SOCIAL_WEIGHT: u32 = 40;

/// Days of inactivity before the decay multiplier applies
pub const INACTIVITY_GRACE_DAYS: i64 = 30;

/// Fused score needed to be hireable
const HIREABLE_MIN_SCORE: u8 = 40;

/// Blend on-chain score and social karma into a 0-100 fused score
///
/// Deterministic and side-effect-free; safe to call as a preview.
pub fn compute_fused_score(on_chain_score: u32, social_karma: u32) -> Result<u8> {
    if on_chain_score > ON_CHAIN_MAX {
        return Err(SwarmPayError::ScoreOutOfRange {
            field: "on_chain_score",
            value: on_chain_score,
            max: ON_CHAIN_MAX,
        });
    }
    if social_karma > SOCIAL_KARMA_MAX {
        return Err(SwarmPayError::ScoreOutOfRange {
            field: "social_karma",
            value: social_karma,
            max: SOCIAL_KARMA_MAX,
        });
    }

    let normalized_on_chain = on_chain_score / 10;
    let normalized_karma = social_karma / 100;
    let fused = (ON_CHAIN_WEIGHT * normalized_on_chain + SOCIAL_WEIGHT * normalized_karma) / 100;

    // Cannot exceed 100 with in-range inputs
    debug_assert!(fused <= 100);
    Ok(fused.min(100) as u8)
}

/// Named reputation band
///
/// The lowest-but-one boundary is pinned at 25 (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Hatchling,
    BronzeShell,
    SilverShell,
    GoldShell,
    DiamondShell,
}

impl Tier {
    /// Map a fused score onto the ordered threshold table
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::DiamondShell,
            70..=89 => Self::GoldShell,
            50..=69 => Self::SilverShell,
            25..=49 => Self::BronzeShell,
            _ => Self::Hatchling,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DiamondShell => "Diamond Shell",
            Self::GoldShell => "Gold Shell",
            Self::SilverShell => "Silver Shell",
            Self::BronzeShell => "Bronze Shell",
            Self::Hatchling => "Hatchling",
        }
    }
}

/// Apply the inactivity decay at query time
///
/// More than 30 days without activity scales the whole fused score by
/// 0.8. The decay is never persisted; an agent that becomes active again
/// reads at full score. A profile with no recorded activity decays.
pub fn effective_score(
    fused: u8,
    last_activity_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u8 {
    let inactive = match last_activity_at {
        Some(at) => now - at > Duration::days(INACTIVITY_GRACE_DAYS),
        None => true,
    };
    if inactive {
        (fused as u32 * 8 / 10) as u8
    } else {
        fused
    }
}

/// Inputs to the hireability assessment
///
/// Missing inputs contribute zero to the fused score and lower the
/// confidence signal; they never error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionInputs {
    pub on_chain_score: Option<u32>,
    pub social_karma: Option<u32>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub active_disputes: u32,
}

/// Answer to "should this agent be hired?"
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HireabilityVerdict {
    pub hireable: bool,
    /// Data-completeness signal in [0, 1]; informational, never gating
    pub confidence: f64,
    /// Fused score after inactivity decay
    pub effective_score: u8,
    pub tier: Tier,
}

/// Evaluate hireability: decayed score >= 40 and no active disputes
pub fn assess_hireability(inputs: &FusionInputs, now: DateTime<Utc>) -> Result<HireabilityVerdict> {
    let fused = compute_fused_score(
        inputs.on_chain_score.unwrap_or(0),
        inputs.social_karma.unwrap_or(0),
    )?;
    let effective = effective_score(fused, inputs.last_activity_at, now);

    let present = [
        inputs.on_chain_score.is_some(),
        inputs.social_karma.is_some(),
        inputs.last_activity_at.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();

    Ok(HireabilityVerdict {
        hireable: effective >= HIREABLE_MIN_SCORE && inputs.active_disputes == 0,
        confidence: present as f64 / 3.0,
        effective_score: effective,
        tier: Tier::from_score(effective),
    })
}
