//! Discord webhook notifier.
//!
//! Posts review outcomes to a guild channel webhook. Any failure
//! (transport, non-2xx, misconfiguration) resolves to a failed
//! [`Dispatch`]; this client never returns an error type.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ApprovalNote, Dispatch, NotificationDispatcher};

/// Webhook settings for outcome notifications.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Webhook URL for the announcements channel. Empty disables sends;
    /// every dispatch then fails softly.
    pub webhook_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Webhook implementation of [`NotificationDispatcher`].
pub struct DiscordNotifier {
    client: Option<Client>,
    config: DiscordConfig,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .ok();
        Self { client, config }
    }

    async fn post(&self, payload: serde_json::Value) -> Dispatch {
        if self.config.webhook_url.is_empty() {
            return Dispatch::failed("discord webhook not configured");
        }
        let Some(client) = &self.client else {
            return Dispatch::failed("http client unavailable");
        };

        let result = client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("notification delivered");
                Dispatch::delivered()
            }
            Ok(response) => {
                let status = response.status();
                let body: String = response
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(200)
                    .collect();
                Dispatch::failed(format!("webhook returned HTTP {status}: {body}"))
            }
            Err(err) => Dispatch::failed(err.to_string()),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for DiscordNotifier {
    async fn send_approval(&self, note: &ApprovalNote) -> Dispatch {
        let mut lines = vec![format!(
            "**{}** completed: +{} {}, +{} credits",
            note.mission.title, note.rewards.xp, note.mission.reward.token, note.rewards.credits
        )];
        if let Some(level) = note.level_up {
            lines.push(format!("Level up! Now level {level}"));
        }
        if let Some(mood) = note.mood_change {
            lines.push(format!("Agent mood is now {mood}"));
        }

        self.post(json!({
            "content": format!("<@{}>", note.user_id),
            "embeds": [{
                "title": "Mission approved",
                "description": lines.join("\n"),
            }],
        }))
        .await
    }

    async fn send_rejection(&self, user_id: &str, mission_title: &str) -> Dispatch {
        self.post(json!({
            "content": format!("<@{user_id}>"),
            "embeds": [{
                "title": "Mission rejected",
                "description": format!(
                    "**{mission_title}** was not approved. Check the review notes and resubmit."
                ),
            }],
        }))
        .await
    }
}
