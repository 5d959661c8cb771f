//! Typed table schemas over opaque store records.
//!
//! The store enforces no schema and may return a number where a string
//! was written (or the reverse), so every read passes through this one
//! seam: a strict struct per table plus the coercion helpers in
//! [`field`]. The rest of the engine only ever sees typed values.

pub mod field;

mod agent;
mod events;
mod grant;
mod mission;
mod user;
mod user_mission;

pub use agent::UserAgent;
pub use events::{CompletionEvent, PrizeWinEvent, PurchaseEvent};
pub use grant::RewardGrant;
pub use mission::{Mission, RewardSpec};
pub use user::User;
pub use user_mission::{MissionStatus, UserMission};

/// Table names in the backing document.
pub mod tables {
    pub const MISSIONS: &str = "Missions";
    pub const USER_MISSIONS: &str = "UserMissions";
    pub const USER_AGENTS: &str = "UserAgents";
    pub const USERS: &str = "Users";
    pub const REWARD_GRANTS: &str = "RewardGrants";
    pub const PURCHASES: &str = "Purchases";
    pub const GACHA_WINS: &str = "GachaWins";
}

/// A record that failed to parse against its table schema.
#[derive(Debug, thiserror::Error)]
#[error("{table} record {id} is malformed: {reason}")]
pub struct RecordError {
    pub table: &'static str,
    pub id: i64,
    pub reason: String,
}

impl RecordError {
    pub fn new(table: &'static str, id: i64, reason: impl Into<String>) -> Self {
        Self {
            table,
            id,
            reason: reason.into(),
        }
    }
}

impl From<RecordError> for crate::store::StoreError {
    fn from(err: RecordError) -> Self {
        crate::store::StoreError::Malformed {
            table: err.table,
            id: err.id,
            reason: err.reason,
        }
    }
}
