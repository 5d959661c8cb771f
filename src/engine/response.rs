//! Wire shapes for review operations.
//!
//! The HTTP shell serializes these directly; field names here are part
//! of the dashboard contract and must not drift.

use serde::Serialize;

use super::{ApprovalOutcome, EngineError, RejectionOutcome, RewardSummary};
use crate::records::{MissionStatus, UserMission};

/// Reward block of a successful approval response.
#[derive(Debug, Clone, Serialize)]
pub struct RewardsBody {
    pub xp: i64,
    pub health: i64,
    pub credits: i64,
    #[serde(rename = "levelUp")]
    pub level_up: bool,
    #[serde(rename = "newLevel", skip_serializing_if = "Option::is_none")]
    pub new_level: Option<i64>,
}

impl From<RewardSummary> for RewardsBody {
    fn from(summary: RewardSummary) -> Self {
        Self {
            xp: summary.xp,
            health: summary.health,
            credits: summary.credits,
            level_up: summary.level_up,
            new_level: summary.new_level,
        }
    }
}

/// Successful approval response.
#[derive(Debug, Serialize)]
pub struct ApprovedBody {
    pub ok: bool,
    pub rewards: RewardsBody,
    pub mission: UserMission,
}

impl From<ApprovalOutcome> for ApprovedBody {
    fn from(outcome: ApprovalOutcome) -> Self {
        Self {
            ok: true,
            rewards: outcome.rewards.into(),
            mission: outcome.mission,
        }
    }
}

/// Successful rejection response.
#[derive(Debug, Serialize)]
pub struct RejectedBody {
    pub ok: bool,
    pub mission: UserMission,
}

impl From<RejectionOutcome> for RejectedBody {
    fn from(outcome: RejectionOutcome) -> Self {
        Self {
            ok: true,
            mission: outcome.mission,
        }
    }
}

/// Failure response. The status fields are present only for state
/// precondition failures, so UIs can render a precise message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    #[serde(rename = "currentStatus", skip_serializing_if = "Option::is_none")]
    pub current_status: Option<MissionStatus>,
    #[serde(rename = "allowedStatus", skip_serializing_if = "Option::is_none")]
    pub allowed_status: Option<MissionStatus>,
}

impl From<&EngineError> for ErrorBody {
    fn from(err: &EngineError) -> Self {
        let (current_status, allowed_status) = match err {
            EngineError::InvalidState { current, allowed } => (Some(*current), Some(*allowed)),
            EngineError::NotFound { .. } => (None, Some(MissionStatus::Submitted)),
            _ => (None, None),
        };
        Self {
            ok: false,
            error: err.to_string(),
            current_status,
            allowed_status,
        }
    }
}
