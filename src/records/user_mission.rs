//! User mission attempts and their lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{field, tables, RecordError};
use crate::store::RawRecord;

/// Lifecycle status of a mission attempt.
///
/// Transitions are monotonic and one-directional: only `Submitted` may
/// move, and only to `Completed` or `Rejected`. The terminal states never
/// change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Accepted,
    Submitted,
    Completed,
    Rejected,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Accepted => "accepted",
            MissionStatus::Submitted => "submitted",
            MissionStatus::Completed => "completed",
            MissionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accepted" => Some(MissionStatus::Accepted),
            "submitted" => Some(MissionStatus::Submitted),
            "completed" => Some(MissionStatus::Completed),
            "rejected" => Some(MissionStatus::Rejected),
            _ => None,
        }
    }

    /// Whether this status can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Rejected)
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's attempt at a mission.
#[derive(Debug, Clone, Serialize)]
pub struct UserMission {
    pub id: i64,
    pub user_id: String,
    pub mission_id: i64,
    pub status: MissionStatus,
    pub accepted_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub submission_link: Option<String>,
    pub verified_by: Option<String>,
    pub notes: Option<String>,
}

impl UserMission {
    pub fn from_raw(raw: &RawRecord) -> Result<Self, RecordError> {
        let user_id = field::text(&raw.fields, "user_id")
            .ok_or_else(|| RecordError::new(tables::USER_MISSIONS, raw.id, "missing user_id"))?;
        let mission_id = field::integer(&raw.fields, "mission_id").ok_or_else(|| {
            RecordError::new(tables::USER_MISSIONS, raw.id, "missing mission_id")
        })?;
        let status_text = field::text(&raw.fields, "status")
            .ok_or_else(|| RecordError::new(tables::USER_MISSIONS, raw.id, "missing status"))?;
        let status = MissionStatus::parse(&status_text).ok_or_else(|| {
            RecordError::new(
                tables::USER_MISSIONS,
                raw.id,
                format!("unknown status {status_text:?}"),
            )
        })?;

        Ok(Self {
            id: raw.id,
            user_id,
            mission_id,
            status,
            accepted_at: field::timestamp(&raw.fields, "accepted_at"),
            submitted_at: field::timestamp(&raw.fields, "submitted_at"),
            completed_at: field::timestamp(&raw.fields, "completed_at"),
            rejected_at: field::timestamp(&raw.fields, "rejected_at"),
            submission_link: field::text(&raw.fields, "submission_link"),
            verified_by: field::text(&raw.fields, "verified_by"),
            notes: field::text(&raw.fields, "notes"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(MissionStatus::parse("Submitted"), Some(MissionStatus::Submitted));
        assert_eq!(MissionStatus::parse(" completed "), Some(MissionStatus::Completed));
        assert_eq!(MissionStatus::parse("in_review"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(MissionStatus::Completed.is_terminal());
        assert!(MissionStatus::Rejected.is_terminal());
        assert!(!MissionStatus::Submitted.is_terminal());
        assert!(!MissionStatus::Accepted.is_terminal());
    }

    #[test]
    fn test_from_raw_coerces_numeric_user_id() {
        let mut fields = crate::store::FieldMap::new();
        // The store can flip a text column to numbers
        fields.insert("user_id".into(), json!(123456789));
        fields.insert("mission_id".into(), json!("7"));
        fields.insert("status".into(), json!("submitted"));
        fields.insert("submitted_at".into(), json!(1_700_000_000));

        let um = UserMission::from_raw(&RawRecord { id: 1, fields }).unwrap();
        assert_eq!(um.user_id, "123456789");
        assert_eq!(um.mission_id, 7);
        assert_eq!(um.status, MissionStatus::Submitted);
        assert!(um.submitted_at.is_some());
        assert!(um.completed_at.is_none());
    }

    #[test]
    fn test_from_raw_rejects_unknown_status() {
        let mut fields = crate::store::FieldMap::new();
        fields.insert("user_id".into(), json!("u-1"));
        fields.insert("mission_id".into(), json!(7));
        fields.insert("status".into(), json!("weird"));

        assert!(UserMission::from_raw(&RawRecord { id: 1, fields }).is_err());
    }
}
