//! User account ledgers.

use serde::Serialize;

use super::{field, tables, RecordError};
use crate::store::RawRecord;

/// Account and financial ledger for a user.
///
/// Mutated alongside the agent on mission completion; purchase and spend
/// events elsewhere also move `credit`.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub discord_id: String,
    pub credit: i64,
    pub total_points: i64,
    pub missions_completed: i64,
}

impl User {
    pub fn from_raw(raw: &RawRecord) -> Result<Self, RecordError> {
        let discord_id = field::text(&raw.fields, "discord_id")
            .ok_or_else(|| RecordError::new(tables::USERS, raw.id, "missing discord_id"))?;

        Ok(Self {
            id: raw.id,
            discord_id,
            credit: field::integer(&raw.fields, "credit").unwrap_or(0),
            total_points: field::integer(&raw.fields, "total_points").unwrap_or(0),
            missions_completed: field::integer(&raw.fields, "missions_completed").unwrap_or(0),
        })
    }
}
