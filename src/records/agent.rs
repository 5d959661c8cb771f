//! Per-user progression ledgers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{field, tables, RecordError};
use crate::progression::{self, LevelSnapshot, Mood};
use crate::store::RawRecord;

/// A user's cumulative progression state.
///
/// `total_xp` and `health` are the source values; level, progress,
/// xp_required, and mood are functions of them. The stored copies of the
/// derived fields exist for dashboard queries only and are rewritten from
/// the sources on every update and never read back as truth.
#[derive(Debug, Clone, Serialize)]
pub struct UserAgent {
    pub id: i64,
    pub user_id: String,
    pub total_xp: i64,
    pub health: i64,
    pub last_active: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserAgent {
    pub fn from_raw(raw: &RawRecord) -> Result<Self, RecordError> {
        let user_id = field::text(&raw.fields, "user_id")
            .ok_or_else(|| RecordError::new(tables::USER_AGENTS, raw.id, "missing user_id"))?;

        Ok(Self {
            id: raw.id,
            user_id,
            total_xp: field::integer(&raw.fields, "total_xp").unwrap_or(0).max(0),
            health: progression::clamp_health(
                field::integer(&raw.fields, "health").unwrap_or(progression::HEALTH_MAX),
            ),
            last_active: field::timestamp(&raw.fields, "last_active"),
            created_at: field::timestamp(&raw.fields, "created_at"),
        })
    }

    /// Level-derived values for the current XP total.
    pub fn level_snapshot(&self) -> LevelSnapshot {
        LevelSnapshot::of(self.total_xp)
    }

    /// Mood for the current health value.
    pub fn mood(&self) -> Mood {
        progression::mood_for_health(self.health)
    }
}
