//! Reputation book
//!
//! Per-agent profile store consumed by the API layer and by the bond
//! ledger's performance gate. Oracle updates are cooldown-gated: a write
//! inside the cooldown window is rejected, never queued — the caller
//! retries later. Fused and effective scores are recomputed on every
//! read, so the inactivity decay is never persisted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::fusion::{assess_hireability, compute_fused_score, FusionInputs, Tier};
use swarmpay_types::{
    AgentId, Clock, CoreConfig, ReputationEvent, ReputationEventKind, Result, SwarmPayError,
};

/// Stored oracle inputs for one agent
#[derive(Debug, Clone, Default)]
struct StoredProfile {
    on_chain_score: u32,
    social_karma: u32,
    has_oracle_data: bool,
    last_activity_at: Option<DateTime<Utc>>,
    active_disputes: u32,
    last_oracle_update_at: Option<DateTime<Utc>>,
}

/// The computed, read-side view of an agent's reputation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationProfile {
    pub agent_id: AgentId,
    pub on_chain_score: u32,
    pub social_karma: u32,
    pub fused_score: u8,
    /// Fused score after inactivity decay; what tier and hireability see
    pub effective_score: u8,
    pub tier: Tier,
    pub hireable: bool,
    pub confidence: f64,
    pub active_disputes: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Per-agent reputation store with oracle-update cooldown
pub struct ReputationBook {
    profiles: Arc<RwLock<HashMap<AgentId, StoredProfile>>>,
    events: Arc<RwLock<Vec<ReputationEvent>>>,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
}

impl ReputationBook {
    pub fn new(config: CoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
            config,
            clock,
        })
    }

    /// Create a zeroed profile; idempotent
    pub async fn register(&self, agent: AgentId) {
        let mut profiles = self.profiles.write().await;
        profiles.entry(agent).or_default();
    }

    /// Record fresh oracle scores for an agent
    ///
    /// Rejected with `CooldownNotElapsed` if the previous update is too
    /// recent; the caller retries after the window.
    pub async fn record_oracle_update(
        &self,
        agent: AgentId,
        on_chain_score: u32,
        social_karma: u32,
    ) -> Result<u8> {
        // Range-check before taking the write lock
        let fused = compute_fused_score(on_chain_score, social_karma)?;
        let now = self.clock.now();

        let mut profiles = self.profiles.write().await;
        let profile = profiles.entry(agent).or_default();

        if let Some(last) = profile.last_oracle_update_at {
            let next_allowed = last + self.config.reputation_update_cooldown;
            if now < next_allowed {
                return Err(SwarmPayError::CooldownNotElapsed {
                    next_allowed_at: next_allowed.to_rfc3339(),
                });
            }
        }

        profile.on_chain_score = on_chain_score;
        profile.social_karma = social_karma;
        profile.has_oracle_data = true;
        profile.last_oracle_update_at = Some(now);
        drop(profiles);

        let mut events = self.events.write().await;
        events.push(ReputationEvent::new(
            agent,
            ReputationEventKind::OracleUpdate,
            0,
            "oracle",
            now,
        ));
        debug!("Oracle update for {agent}: fused score {fused}");
        Ok(fused)
    }

    /// Note agent activity; resets the inactivity decay window
    pub async fn note_activity(&self, agent: AgentId) {
        let now = self.clock.now();
        let mut profiles = self.profiles.write().await;
        profiles.entry(agent).or_default().last_activity_at = Some(now);
    }

    /// Track dispute lifecycle for the hireability predicate
    pub async fn dispute_opened(&self, agent: AgentId) {
        let mut profiles = self.profiles.write().await;
        profiles.entry(agent).or_default().active_disputes += 1;
    }

    pub async fn dispute_closed(&self, agent: AgentId) {
        let mut profiles = self.profiles.write().await;
        let profile = profiles.entry(agent).or_default();
        profile.active_disputes = profile.active_disputes.saturating_sub(1);
    }

    /// Append a settlement-emitted reputation event
    pub async fn record_event(&self, event: ReputationEvent) {
        info!(
            "Reputation event for {}: {:?} ({:+})",
            event.agent_id, event.kind, event.score_change
        );
        self.events.write().await.push(event);
    }

    /// The computed profile; fused/effective scores recomputed on read
    pub async fn profile(&self, agent: &AgentId) -> Result<ReputationProfile> {
        let now = self.clock.now();
        let profiles = self.profiles.read().await;
        let stored = profiles
            .get(agent)
            .ok_or_else(|| SwarmPayError::ProfileNotFound {
                agent_id: agent.to_string(),
            })?;

        let inputs = FusionInputs {
            on_chain_score: stored.has_oracle_data.then_some(stored.on_chain_score),
            social_karma: stored.has_oracle_data.then_some(stored.social_karma),
            last_activity_at: stored.last_activity_at,
            active_disputes: stored.active_disputes,
        };
        let verdict = assess_hireability(&inputs, now)?;
        let fused = compute_fused_score(stored.on_chain_score, stored.social_karma)?;

        Ok(ReputationProfile {
            agent_id: *agent,
            on_chain_score: stored.on_chain_score,
            social_karma: stored.social_karma,
            fused_score: fused,
            effective_score: verdict.effective_score,
            tier: verdict.tier,
            hireable: verdict.hireable,
            confidence: verdict.confidence,
            active_disputes: stored.active_disputes,
            last_activity_at: stored.last_activity_at,
        })
    }

    /// Event history for an agent, oldest first
    pub async fn events_for(&self, agent: &AgentId) -> Vec<ReputationEvent> {
        let events = self.events.read().await;
        events
            .iter()
            .filter(|e| &e.agent_id == agent)
            .cloned()
            .collect()
    }
}
