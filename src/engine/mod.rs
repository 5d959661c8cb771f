//! Mission state machine.
//!
//! Validates and executes the submitted -> completed | rejected
//! transition and orchestrates reward issuance. The status write is the
//! authoritative decision; reward grants are replay-safe follow-ups
//! keyed by (user, mission), and the outbound notification is
//! best-effort and can never fail the operation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RewardPolicy;
use crate::notify::{ApprovalNote, NotificationDispatcher};
use crate::progression::{self, Mood};
use crate::records::{Mission, MissionStatus, RewardSpec, UserMission};
use crate::repository::Tables;
use crate::store::{RecordStore, StoreError};
use crate::utils::KeyedLocks;

pub mod response;

pub use response::{ErrorBody, RewardsBody};

/// Errors surfaced by review operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed input; checked before any store traffic.
    #[error("invalid request: {0}")]
    Validation(String),

    /// No attempt exists for the (user, mission) pair.
    #[error("no mission attempt found for user {user_id} and mission {mission_id}")]
    NotFound { user_id: String, mission_id: i64 },

    /// The attempt is not in the one state reviews may act on.
    #[error("mission attempt is {current}; only {allowed} attempts can be reviewed")]
    InvalidState {
        current: MissionStatus,
        allowed: MissionStatus,
    },

    /// Record store failure; the whole operation failed.
    #[error("record store failure: {0}")]
    Dependency(#[from] StoreError),
}

/// A reviewer's decision on one mission attempt.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ReviewRequest {
    pub user_id: String,
    pub mission_id: String,
    #[serde(default)]
    pub reviewer_id: Option<String>,
}

/// Rewards issued by an approval.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RewardSummary {
    /// XP added to the agent.
    pub xp: i64,
    /// Health actually gained after clamping.
    pub health: i64,
    /// Credits added to the user ledger.
    pub credits: i64,
    pub level_up: bool,
    pub new_level: Option<i64>,
}

/// Catalog details attached to outcomes and notifications.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MissionView {
    pub id: i64,
    pub title: String,
    pub reward: RewardSpec,
}

impl MissionView {
    fn from_catalog(mission_id: i64, mission: Option<&Mission>) -> Self {
        match mission {
            Some(m) => Self {
                id: m.id,
                title: m.title.clone(),
                reward: m.reward.clone(),
            },
            None => Self {
                id: mission_id,
                title: format!("Mission {mission_id}"),
                reward: RewardSpec::default(),
            },
        }
    }
}

/// Result of a successful approval.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApprovalOutcome {
    pub rewards: RewardSummary,
    pub mission: UserMission,
    pub mood_change: Option<Mood>,
    pub correlation_id: String,
}

/// Result of a successful rejection.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RejectionOutcome {
    pub mission: UserMission,
    pub correlation_id: String,
}

/// The mission lifecycle engine.
///
/// Request-driven and synchronous: each call performs its reads and
/// writes against a store fetched fresh, with no shared mutable state
/// beyond the per-key serialization locks.
pub struct MissionEngine {
    tables: Tables,
    notifier: Arc<dyn NotificationDispatcher>,
    policy: RewardPolicy,
    locks: KeyedLocks,
}

impl MissionEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        policy: RewardPolicy,
    ) -> Self {
        Self {
            tables: Tables::new(store),
            notifier,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    /// Approve a submitted mission attempt and issue its rewards.
    pub async fn approve(&self, request: &ReviewRequest) -> Result<ApprovalOutcome, EngineError> {
        let (user_id, mission_id) = validate(request)?;
        let reviewer = request.reviewer_id.as_deref();
        let correlation_id = correlation_id("approve", &user_id, mission_id);

        // Serialize reviews of the same attempt: the second caller waits
        // here and then fails the status precondition.
        let _guard = self.locks.acquire(&lock_key(&user_id, mission_id)).await;

        let attempt = self.load_submitted(&user_id, mission_id).await?;
        let mission = self.tables.mission(mission_id).await?;
        let reward = mission
            .as_ref()
            .map(|m| m.reward.clone())
            .unwrap_or_default();

        let decided_at = Utc::now();
        // Durable decision first; rewards are replay-safe follow-ups.
        self.tables
            .mark_reviewed(&attempt, MissionStatus::Completed, reviewer, decided_at)
            .await?;

        let (rewards, mood_change) = self
            .grant_rewards(&user_id, mission_id, &reward, reviewer, decided_at)
            .await?;

        info!(
            %correlation_id,
            %user_id,
            mission_id,
            xp = rewards.xp,
            credits = rewards.credits,
            level_up = rewards.level_up,
            "mission approved"
        );

        let updated = UserMission {
            status: MissionStatus::Completed,
            completed_at: Some(decided_at),
            verified_by: reviewer.map(str::to_string),
            ..attempt
        };
        drop(_guard);

        let note = ApprovalNote {
            user_id: user_id.clone(),
            mission_id,
            mission: MissionView::from_catalog(mission_id, mission.as_ref()),
            rewards,
            level_up: rewards.new_level,
            mood_change,
        };
        let dispatch = self.notifier.send_approval(&note).await;
        if !dispatch.success {
            warn!(
                %correlation_id,
                %user_id,
                mission_id,
                error = dispatch.error.as_deref().unwrap_or("unknown"),
                "approval notification failed"
            );
        }

        Ok(ApprovalOutcome {
            rewards,
            mission: updated,
            mood_change,
            correlation_id,
        })
    }

    /// Reject a submitted mission attempt. No reward side effects.
    pub async fn reject(&self, request: &ReviewRequest) -> Result<RejectionOutcome, EngineError> {
        let (user_id, mission_id) = validate(request)?;
        let reviewer = request.reviewer_id.as_deref();
        let correlation_id = correlation_id("reject", &user_id, mission_id);

        let _guard = self.locks.acquire(&lock_key(&user_id, mission_id)).await;

        let attempt = self.load_submitted(&user_id, mission_id).await?;
        let decided_at = Utc::now();
        self.tables
            .mark_reviewed(&attempt, MissionStatus::Rejected, reviewer, decided_at)
            .await?;

        info!(%correlation_id, %user_id, mission_id, "mission rejected");

        let updated = UserMission {
            status: MissionStatus::Rejected,
            completed_at: Some(decided_at),
            rejected_at: Some(decided_at),
            verified_by: reviewer.map(str::to_string),
            ..attempt
        };
        drop(_guard);

        let title = match self.tables.mission(mission_id).await {
            Ok(mission) => MissionView::from_catalog(mission_id, mission.as_ref()).title,
            Err(err) => {
                // The decision is already durable; a catalog read failure
                // only degrades the notification text.
                warn!(%correlation_id, error = %err, "mission title lookup failed");
                format!("Mission {mission_id}")
            }
        };
        let dispatch = self.notifier.send_rejection(&user_id, &title).await;
        if !dispatch.success {
            warn!(
                %correlation_id,
                %user_id,
                mission_id,
                error = dispatch.error.as_deref().unwrap_or("unknown"),
                "rejection notification failed"
            );
        }

        Ok(RejectionOutcome {
            mission: updated,
            correlation_id,
        })
    }

    /// Attempts awaiting review, newest first. Read-only dashboard feed.
    pub async fn pending_submissions(&self) -> Result<Vec<UserMission>, EngineError> {
        Ok(self.tables.submitted_missions().await?)
    }

    async fn load_submitted(
        &self,
        user_id: &str,
        mission_id: i64,
    ) -> Result<UserMission, EngineError> {
        let attempt = self
            .tables
            .find_user_mission(user_id, mission_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                user_id: user_id.to_string(),
                mission_id,
            })?;

        if attempt.status != MissionStatus::Submitted {
            return Err(EngineError::InvalidState {
                current: attempt.status,
                allowed: MissionStatus::Submitted,
            });
        }
        Ok(attempt)
    }

    /// Issue rewards for an approved attempt, exactly once.
    ///
    /// The grant row is written before the ledger increments: a replay
    /// that finds the row is a no-op, so an interrupted grant can never
    /// double-count.
    async fn grant_rewards(
        &self,
        user_id: &str,
        mission_id: i64,
        reward: &RewardSpec,
        reviewer: Option<&str>,
        decided_at: chrono::DateTime<Utc>,
    ) -> Result<(RewardSummary, Option<Mood>), EngineError> {
        if let Some(existing) = self.tables.find_grant(user_id, mission_id).await? {
            info!(
                %user_id,
                mission_id,
                grant = existing.id,
                "reward grant already recorded; skipping"
            );
            return Ok((
                RewardSummary {
                    xp: existing.xp,
                    health: existing.health,
                    credits: existing.credits,
                    level_up: false,
                    new_level: None,
                },
                None,
            ));
        }

        let agent = match self.tables.user_agent(user_id).await? {
            Some(agent) => agent,
            None => self.tables.create_user_agent(user_id, decided_at).await?,
        };

        let xp = reward.amount;
        let credits = self.policy.credits_for(xp);
        let new_xp = agent.total_xp + xp;
        let new_health = progression::clamp_health(agent.health + self.policy.health_bonus);
        let health_gained = new_health - agent.health;

        self.tables
            .record_grant(
                user_id,
                mission_id,
                xp,
                credits,
                health_gained,
                reviewer,
                decided_at,
            )
            .await?;

        self.tables
            .save_agent_progress(agent.id, new_xp, new_health, decided_at)
            .await?;

        let user = match self.tables.user(user_id).await? {
            Some(user) => user,
            None => self.tables.create_user(user_id).await?,
        };
        self.tables.apply_user_ledger(&user, credits, xp).await?;

        let level_up = progression::leveled_up(agent.total_xp, new_xp);
        let old_mood = agent.mood();
        let new_mood = progression::mood_for_health(new_health);

        Ok((
            RewardSummary {
                xp,
                health: health_gained,
                credits,
                level_up,
                new_level: level_up.then(|| progression::level_for_xp(new_xp)),
            },
            (new_mood != old_mood).then_some(new_mood),
        ))
    }
}

/// Check request fields before any side effects.
fn validate(request: &ReviewRequest) -> Result<(String, i64), EngineError> {
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(EngineError::Validation("user_id is required".to_string()));
    }

    let mission_id = request
        .mission_id
        .trim()
        .parse::<i64>()
        .map_err(|_| {
            EngineError::Validation(format!(
                "mission_id must be numeric, got {:?}",
                request.mission_id
            ))
        })?;

    Ok((user_id.to_string(), mission_id))
}

fn lock_key(user_id: &str, mission_id: i64) -> String {
    format!("{user_id}:{mission_id}")
}

/// Deterministic correlation id for a review operation, propagated into
/// logs and notifications.
fn correlation_id(op: &str, user_id: &str, mission_id: i64) -> String {
    let namespace = Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"questboard.dev");
    Uuid::new_v5(&namespace, format!("{op}:{user_id}:{mission_id}").as_bytes()).to_string()
}
