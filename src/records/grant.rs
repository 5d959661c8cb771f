//! Reward grant ledger rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{field, tables, RecordError};
use crate::store::RawRecord;

/// Durable record that rewards for a (user, mission) pair were issued.
///
/// The pair is the dedup key: a grant that finds its key already present
/// is a replay and must not count twice. The row is written before the
/// ledger increments it describes, so an interrupted grant resolves to
/// at-most-once rather than double-counting.
#[derive(Debug, Clone, Serialize)]
pub struct RewardGrant {
    pub id: i64,
    pub user_id: String,
    pub mission_id: i64,
    pub xp: i64,
    pub credits: i64,
    pub health: i64,
    pub granted_at: Option<DateTime<Utc>>,
    pub granted_by: Option<String>,
}

impl RewardGrant {
    pub fn from_raw(raw: &RawRecord) -> Result<Self, RecordError> {
        let user_id = field::text(&raw.fields, "user_id")
            .ok_or_else(|| RecordError::new(tables::REWARD_GRANTS, raw.id, "missing user_id"))?;
        let mission_id = field::integer(&raw.fields, "mission_id").ok_or_else(|| {
            RecordError::new(tables::REWARD_GRANTS, raw.id, "missing mission_id")
        })?;

        Ok(Self {
            id: raw.id,
            user_id,
            mission_id,
            xp: field::integer(&raw.fields, "xp").unwrap_or(0),
            credits: field::integer(&raw.fields, "credits").unwrap_or(0),
            health: field::integer(&raw.fields, "health").unwrap_or(0),
            granted_at: field::timestamp(&raw.fields, "granted_at"),
            granted_by: field::text(&raw.fields, "granted_by"),
        })
    }
}
