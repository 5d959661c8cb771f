//! Outcome notifications.
//!
//! This module contains:
//! - `NotificationDispatcher` trait: best-effort delivery of review
//!   outcomes
//! - Implementations: Discord webhook, Mock
//!
//! Delivery failure is data, not control flow: every send resolves to a
//! [`Dispatch`] value and the engine only ever logs a failed one. Nothing
//! here can roll back or fail a committed state transition.

use async_trait::async_trait;
use serde::Serialize;

use crate::engine::{MissionView, RewardSummary};
use crate::progression::Mood;

pub mod discord;
pub mod mock;

pub use discord::{DiscordConfig, DiscordNotifier};
pub use mock::{MockNotifier, SentNote};

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub success: bool,
    pub error: Option<String>,
}

impl Dispatch {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Payload for an approval notification.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalNote {
    pub user_id: String,
    pub mission_id: i64,
    pub mission: MissionView,
    pub rewards: RewardSummary,
    #[serde(rename = "levelUp", skip_serializing_if = "Option::is_none")]
    pub level_up: Option<i64>,
    #[serde(rename = "moodChange", skip_serializing_if = "Option::is_none")]
    pub mood_change: Option<Mood>,
}

/// Best-effort delivery of review outcomes.
///
/// Implementations:
/// - `DiscordNotifier`: webhook delivery to a guild channel
/// - `MockNotifier`: In-memory recorder for testing
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Tell a user their mission was approved and what it earned them.
    async fn send_approval(&self, note: &ApprovalNote) -> Dispatch;

    /// Tell a user their mission was rejected.
    async fn send_rejection(&self, user_id: &str, mission_title: &str) -> Dispatch;
}
