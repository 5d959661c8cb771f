//! Typed table access over the record store.
//!
//! `Tables` is the single seam where opaque records become typed values.
//! List reads skip malformed rows with a warning (a bad row must not
//! poison a whole dashboard); reads backing a state transition fail hard
//! instead, because acting on a half-parsed record is worse than failing
//! the request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::progression::{self, LevelSnapshot};
use crate::records::{
    field, tables, CompletionEvent, Mission, MissionStatus, PrizeWinEvent, PurchaseEvent,
    RewardGrant, User, UserAgent, UserMission,
};
use crate::store::{FieldMap, Filter, RecordStore, RecordUpdate, Result};

/// Typed repository over the record store.
#[derive(Clone)]
pub struct Tables {
    store: Arc<dyn RecordStore>,
}

impl Tables {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Parse every row of a fetch, skipping rows that fail their schema.
    fn parse_all<T>(
        rows: Vec<crate::store::RawRecord>,
        table: &'static str,
        parse: impl Fn(&crate::store::RawRecord) -> std::result::Result<T, crate::records::RecordError>,
    ) -> Vec<T> {
        rows.iter()
            .filter_map(|raw| match parse(raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(table, record = raw.id, error = %err, "skipping malformed record");
                    None
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Missions
    // ------------------------------------------------------------------

    /// Look up a catalog mission by id.
    pub async fn mission(&self, mission_id: i64) -> Result<Option<Mission>> {
        let rows = self.store.fetch_table(tables::MISSIONS, None).await?;
        for raw in rows.iter().filter(|r| r.id == mission_id) {
            return Ok(Some(Mission::from_raw(raw)?));
        }
        Ok(None)
    }

    // ------------------------------------------------------------------
    // User missions
    // ------------------------------------------------------------------

    /// Find a user's attempt at a mission.
    ///
    /// A malformed attempt row is a hard error here: this read gates a
    /// state transition.
    pub async fn find_user_mission(
        &self,
        user_id: &str,
        mission_id: i64,
    ) -> Result<Option<UserMission>> {
        let filter = Filter::new()
            .eq("user_id", user_id)
            .eq("mission_id", mission_id);
        let rows = self
            .store
            .fetch_table(tables::USER_MISSIONS, Some(&filter))
            .await?;

        match rows.first() {
            Some(raw) => Ok(Some(UserMission::from_raw(raw)?)),
            None => Ok(None),
        }
    }

    /// All attempts currently awaiting review, newest submission first.
    pub async fn submitted_missions(&self) -> Result<Vec<UserMission>> {
        let filter = Filter::new().eq("status", MissionStatus::Submitted.as_str());
        let rows = self
            .store
            .fetch_table(tables::USER_MISSIONS, Some(&filter))
            .await?;

        let mut attempts = Self::parse_all(rows, tables::USER_MISSIONS, UserMission::from_raw);
        attempts.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(attempts)
    }

    /// Write the terminal decision for an attempt.
    ///
    /// `completed_at` is the decision timestamp for both outcomes; a
    /// rejection additionally stamps `rejected_at`.
    pub async fn mark_reviewed(
        &self,
        attempt: &UserMission,
        status: MissionStatus,
        reviewer: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut fields = FieldMap::new();
        fields.insert("status".into(), Value::from(status.as_str()));
        fields.insert("completed_at".into(), field::encode_timestamp(decided_at));
        if status == MissionStatus::Rejected {
            fields.insert("rejected_at".into(), field::encode_timestamp(decided_at));
        }
        if let Some(reviewer) = reviewer {
            fields.insert("verified_by".into(), Value::from(reviewer));
        }

        self.store
            .update_records(
                tables::USER_MISSIONS,
                vec![RecordUpdate {
                    id: attempt.id,
                    fields,
                }],
            )
            .await
    }

    // ------------------------------------------------------------------
    // User agents
    // ------------------------------------------------------------------

    pub async fn user_agent(&self, user_id: &str) -> Result<Option<UserAgent>> {
        let filter = Filter::new().eq("user_id", user_id);
        let rows = self
            .store
            .fetch_table(tables::USER_AGENTS, Some(&filter))
            .await?;

        match rows.first() {
            Some(raw) => Ok(Some(UserAgent::from_raw(raw)?)),
            None => Ok(None),
        }
    }

    /// Create the progression ledger for a user who has none yet.
    pub async fn create_user_agent(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UserAgent> {
        let mut fields = FieldMap::new();
        fields.insert("user_id".into(), Value::from(user_id));
        fields.insert("total_xp".into(), Value::from(0));
        fields.insert("health".into(), Value::from(progression::HEALTH_MAX));
        fields.insert("created_at".into(), field::encode_timestamp(now));
        let snapshot = LevelSnapshot::of(0);
        fields.insert("level".into(), Value::from(snapshot.level));
        fields.insert(
            "current_level_progress".into(),
            Value::from(snapshot.progress),
        );
        fields.insert("xp_required".into(), Value::from(snapshot.xp_required));
        fields.insert(
            "mood".into(),
            Value::from(progression::mood_for_health(progression::HEALTH_MAX).as_str()),
        );

        let ids = self
            .store
            .add_records(tables::USER_AGENTS, vec![fields])
            .await?;

        Ok(UserAgent {
            id: ids.first().copied().unwrap_or_default(),
            user_id: user_id.to_string(),
            total_xp: 0,
            health: progression::HEALTH_MAX,
            last_active: None,
            created_at: Some(now),
        })
    }

    /// Persist new progression sources plus every derived field.
    ///
    /// Derived values are recomputed here from `total_xp`/`health`; the
    /// stored copies can never drift from their sources.
    pub async fn save_agent_progress(
        &self,
        agent_id: i64,
        total_xp: i64,
        health: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let health = progression::clamp_health(health);
        let snapshot = LevelSnapshot::of(total_xp);

        let mut fields = FieldMap::new();
        fields.insert("total_xp".into(), Value::from(total_xp));
        fields.insert("health".into(), Value::from(health));
        fields.insert("level".into(), Value::from(snapshot.level));
        fields.insert(
            "current_level_progress".into(),
            Value::from(snapshot.progress),
        );
        fields.insert("xp_required".into(), Value::from(snapshot.xp_required));
        fields.insert(
            "mood".into(),
            Value::from(progression::mood_for_health(health).as_str()),
        );
        fields.insert("last_active".into(), field::encode_timestamp(now));

        self.store
            .update_records(
                tables::USER_AGENTS,
                vec![RecordUpdate {
                    id: agent_id,
                    fields,
                }],
            )
            .await
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn user(&self, discord_id: &str) -> Result<Option<User>> {
        let filter = Filter::new().eq("discord_id", discord_id);
        let rows = self.store.fetch_table(tables::USERS, Some(&filter)).await?;

        match rows.first() {
            Some(raw) => Ok(Some(User::from_raw(raw)?)),
            None => Ok(None),
        }
    }

    pub async fn create_user(&self, discord_id: &str) -> Result<User> {
        let mut fields = FieldMap::new();
        fields.insert("discord_id".into(), Value::from(discord_id));
        fields.insert("credit".into(), Value::from(0));
        fields.insert("total_points".into(), Value::from(0));
        fields.insert("missions_completed".into(), Value::from(0));

        let ids = self.store.add_records(tables::USERS, vec![fields]).await?;

        Ok(User {
            id: ids.first().copied().unwrap_or_default(),
            discord_id: discord_id.to_string(),
            credit: 0,
            total_points: 0,
            missions_completed: 0,
        })
    }

    /// Apply ledger increments from a completed mission.
    pub async fn apply_user_ledger(
        &self,
        user: &User,
        credit_delta: i64,
        points_delta: i64,
    ) -> Result<()> {
        let mut fields = FieldMap::new();
        fields.insert("credit".into(), Value::from(user.credit + credit_delta));
        fields.insert(
            "total_points".into(),
            Value::from(user.total_points + points_delta),
        );
        fields.insert(
            "missions_completed".into(),
            Value::from(user.missions_completed + 1),
        );

        self.store
            .update_records(
                tables::USERS,
                vec![RecordUpdate {
                    id: user.id,
                    fields,
                }],
            )
            .await
    }

    // ------------------------------------------------------------------
    // Reward grants
    // ------------------------------------------------------------------

    pub async fn find_grant(
        &self,
        user_id: &str,
        mission_id: i64,
    ) -> Result<Option<RewardGrant>> {
        let filter = Filter::new()
            .eq("user_id", user_id)
            .eq("mission_id", mission_id);
        let rows = self
            .store
            .fetch_table(tables::REWARD_GRANTS, Some(&filter))
            .await?;

        match rows.first() {
            Some(raw) => Ok(Some(RewardGrant::from_raw(raw)?)),
            None => Ok(None),
        }
    }

    /// Record that rewards were issued for a (user, mission) pair.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_grant(
        &self,
        user_id: &str,
        mission_id: i64,
        xp: i64,
        credits: i64,
        health: i64,
        reviewer: Option<&str>,
        granted_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut fields = FieldMap::new();
        fields.insert("user_id".into(), Value::from(user_id));
        fields.insert("mission_id".into(), Value::from(mission_id));
        fields.insert("xp".into(), Value::from(xp));
        fields.insert("credits".into(), Value::from(credits));
        fields.insert("health".into(), Value::from(health));
        fields.insert("granted_at".into(), field::encode_timestamp(granted_at));
        if let Some(reviewer) = reviewer {
            fields.insert("granted_by".into(), Value::from(reviewer));
        }

        self.store
            .add_records(tables::REWARD_GRANTS, vec![fields])
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Event logs for aggregation
    // ------------------------------------------------------------------

    pub async fn purchase_events(&self) -> Result<Vec<PurchaseEvent>> {
        let rows = self.store.fetch_table(tables::PURCHASES, None).await?;
        Ok(Self::parse_all(rows, tables::PURCHASES, PurchaseEvent::from_raw))
    }

    pub async fn prize_events(&self) -> Result<Vec<PrizeWinEvent>> {
        let rows = self.store.fetch_table(tables::GACHA_WINS, None).await?;
        Ok(Self::parse_all(rows, tables::GACHA_WINS, PrizeWinEvent::from_raw))
    }

    /// Mission completions as aggregation input, sourced from the grant
    /// ledger.
    pub async fn completion_events(&self) -> Result<Vec<CompletionEvent>> {
        let rows = self.store.fetch_table(tables::REWARD_GRANTS, None).await?;
        let grants = Self::parse_all(rows, tables::REWARD_GRANTS, RewardGrant::from_raw);
        Ok(grants.iter().map(CompletionEvent::from).collect())
    }
}
