//! Mock notifier for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ApprovalNote, Dispatch, NotificationDispatcher};

/// A recorded delivery attempt.
#[derive(Debug, Clone)]
pub enum SentNote {
    Approval(ApprovalNote),
    Rejection { user_id: String, title: String },
}

/// In-memory notifier that records every send.
#[derive(Default)]
pub struct MockNotifier {
    sent: RwLock<Vec<SentNote>>,
    fail: RwLock<bool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    pub async fn sent(&self) -> Vec<SentNote> {
        self.sent.read().await.clone()
    }

    async fn outcome(&self) -> Dispatch {
        if *self.fail.read().await {
            Dispatch::failed("mock notifier down")
        } else {
            Dispatch::delivered()
        }
    }
}

#[async_trait]
impl NotificationDispatcher for MockNotifier {
    async fn send_approval(&self, note: &ApprovalNote) -> Dispatch {
        self.sent.write().await.push(SentNote::Approval(note.clone()));
        self.outcome().await
    }

    async fn send_rejection(&self, user_id: &str, mission_title: &str) -> Dispatch {
        self.sent.write().await.push(SentNote::Rejection {
            user_id: user_id.to_string(),
            title: mission_title.to_string(),
        });
        self.outcome().await
    }
}
