//! End-to-end review flows against the in-memory store and notifier.

use std::sync::Arc;

use serde_json::{json, Value};

use questboard::config::RewardPolicy;
use questboard::engine::{EngineError, MissionEngine, ReviewRequest};
use questboard::notify::{MockNotifier, SentNote};
use questboard::records::tables;
use questboard::store::{FieldMap, MockRecordStore};

fn fields(pairs: &[(&str, Value)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

struct Harness {
    store: Arc<MockRecordStore>,
    notifier: Arc<MockNotifier>,
    engine: Arc<MissionEngine>,
}

fn harness() -> Harness {
    let store = Arc::new(MockRecordStore::new());
    let notifier = Arc::new(MockNotifier::new());
    let engine = Arc::new(MissionEngine::new(
        store.clone(),
        notifier.clone(),
        RewardPolicy::default(),
    ));
    Harness {
        store,
        notifier,
        engine,
    }
}

async fn seed_mission(store: &MockRecordStore, reward: Value) -> i64 {
    store
        .seed(
            tables::MISSIONS,
            fields(&[
                ("title", json!("Host a community call")),
                ("description", json!("Run one call and post the recap")),
                ("reward", reward),
            ]),
        )
        .await
}

async fn seed_submission(store: &MockRecordStore, user_id: &str, mission_id: i64) -> i64 {
    store
        .seed(
            tables::USER_MISSIONS,
            fields(&[
                ("user_id", json!(user_id)),
                ("mission_id", json!(mission_id)),
                ("status", json!("submitted")),
                ("submitted_at", json!(1_700_000_000)),
            ]),
        )
        .await
}

fn request(user_id: &str, mission_id: i64) -> ReviewRequest {
    ReviewRequest {
        user_id: user_id.to_string(),
        mission_id: mission_id.to_string(),
        reviewer_id: Some("admin-7".to_string()),
    }
}

#[tokio::test]
async fn approve_grants_rewards_and_creates_ledgers() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!("75 QP")).await;
    let attempt_id = seed_submission(&h.store, "u-1", mission_id).await;

    let outcome = h.engine.approve(&request("u-1", mission_id)).await.unwrap();

    assert_eq!(outcome.rewards.xp, 75);
    assert_eq!(outcome.rewards.credits, 75);
    assert_eq!(outcome.rewards.health, 0, "fresh agents are already at full health");
    assert!(!outcome.rewards.level_up);
    assert_eq!(outcome.mission.status.as_str(), "completed");
    assert_eq!(outcome.mission.verified_by.as_deref(), Some("admin-7"));

    // Attempt row flipped durably
    let row = h.store.get(tables::USER_MISSIONS, attempt_id).await.unwrap();
    assert_eq!(row.fields["status"], json!("completed"));
    assert_eq!(row.fields["verified_by"], json!("admin-7"));
    assert!(row.fields.contains_key("completed_at"));

    // Agent created lazily with the grant applied
    let agents = h.store.row_count(tables::USER_AGENTS).await;
    assert_eq!(agents, 1);
    let agent = h.store.get(tables::USER_AGENTS, 1).await.unwrap();
    assert_eq!(agent.fields["total_xp"], json!(75));
    assert_eq!(agent.fields["health"], json!(100));
    assert_eq!(agent.fields["level"], json!(1));
    assert_eq!(agent.fields["mood"], json!("happy"));

    // User ledger created and incremented
    let user = h.store.get(tables::USERS, 1).await.unwrap();
    assert_eq!(user.fields["credit"], json!(75));
    assert_eq!(user.fields["total_points"], json!(75));
    assert_eq!(user.fields["missions_completed"], json!(1));

    // Grant ledger row exists for the pair
    assert_eq!(h.store.row_count(tables::REWARD_GRANTS).await, 1);

    // Approval notification went out
    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        SentNote::Approval(note) => {
            assert_eq!(note.user_id, "u-1");
            assert_eq!(note.rewards.xp, 75);
            assert_eq!(note.mission.title, "Host a community call");
        }
        other => panic!("expected approval, got {other:?}"),
    }
}

#[tokio::test]
async fn approve_detects_level_up_across_threshold() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!(10)).await;
    seed_submission(&h.store, "u-1", mission_id).await;
    // Existing agent sitting just below the level 2 threshold
    h.store
        .seed(
            tables::USER_AGENTS,
            fields(&[
                ("user_id", json!("u-1")),
                ("total_xp", json!(95)),
                ("health", json!(50)),
            ]),
        )
        .await;

    let outcome = h.engine.approve(&request("u-1", mission_id)).await.unwrap();

    assert!(outcome.rewards.level_up);
    assert_eq!(outcome.rewards.new_level, Some(2));
    assert_eq!(outcome.rewards.health, 10);

    let agent = h.store.get(tables::USER_AGENTS, 1).await.unwrap();
    assert_eq!(agent.fields["total_xp"], json!(105));
    assert_eq!(agent.fields["level"], json!(2));
    assert_eq!(agent.fields["current_level_progress"], json!(5));
    assert_eq!(agent.fields["health"], json!(60));
    assert_eq!(agent.fields["mood"], json!("neutral"));
}

#[tokio::test]
async fn approve_unparsable_reward_defaults_to_fifty_xp() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!("finish onboarding")).await;
    seed_submission(&h.store, "u-1", mission_id).await;

    let outcome = h.engine.approve(&request("u-1", mission_id)).await.unwrap();
    assert_eq!(outcome.rewards.xp, 50);
    assert_eq!(outcome.rewards.credits, 50);
}

#[tokio::test]
async fn approve_requires_submitted_status() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!(50)).await;
    h.store
        .seed(
            tables::USER_MISSIONS,
            fields(&[
                ("user_id", json!("u-1")),
                ("mission_id", json!(mission_id)),
                ("status", json!("accepted")),
            ]),
        )
        .await;

    let err = h.engine.approve(&request("u-1", mission_id)).await.unwrap_err();
    match err {
        EngineError::InvalidState { current, allowed } => {
            assert_eq!(current.as_str(), "accepted");
            assert_eq!(allowed.as_str(), "submitted");
        }
        other => panic!("expected InvalidState, got {other:?}"),
    }

    // Precondition failure leaves no side effects behind
    assert_eq!(h.store.row_count(tables::USER_AGENTS).await, 0);
    assert_eq!(h.store.row_count(tables::REWARD_GRANTS).await, 0);
    assert!(h.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn approve_missing_attempt_is_not_found() {
    let h = harness();
    let err = h.engine.approve(&request("ghost", 42)).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn second_approval_fails_without_double_rewards() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!(50)).await;
    seed_submission(&h.store, "u-1", mission_id).await;

    h.engine.approve(&request("u-1", mission_id)).await.unwrap();
    let err = h.engine.approve(&request("u-1", mission_id)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));

    let agent = h.store.get(tables::USER_AGENTS, 1).await.unwrap();
    assert_eq!(agent.fields["total_xp"], json!(50));
    let user = h.store.get(tables::USERS, 1).await.unwrap();
    assert_eq!(user.fields["credit"], json!(50));
    assert_eq!(h.store.row_count(tables::REWARD_GRANTS).await, 1);
}

#[tokio::test]
async fn concurrent_approvals_serialize_to_one_winner() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!(50)).await;
    seed_submission(&h.store, "u-1", mission_id).await;

    let a = {
        let engine = h.engine.clone();
        let req = request("u-1", mission_id);
        tokio::spawn(async move { engine.approve(&req).await })
    };
    let b = {
        let engine = h.engine.clone();
        let req = request("u-1", mission_id);
        tokio::spawn(async move { engine.approve(&req).await })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one approval must win");

    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(loser, EngineError::InvalidState { .. }));

    // Rewards issued exactly once
    let agent = h.store.get(tables::USER_AGENTS, 1).await.unwrap();
    assert_eq!(agent.fields["total_xp"], json!(50));
    assert_eq!(h.store.row_count(tables::REWARD_GRANTS).await, 1);
}

#[tokio::test]
async fn reject_has_no_reward_side_effects() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!(50)).await;
    let attempt_id = seed_submission(&h.store, "u-1", mission_id).await;

    let outcome = h.engine.reject(&request("u-1", mission_id)).await.unwrap();
    assert_eq!(outcome.mission.status.as_str(), "rejected");

    let row = h.store.get(tables::USER_MISSIONS, attempt_id).await.unwrap();
    assert_eq!(row.fields["status"], json!("rejected"));
    // The decision timestamp lands in completed_at for both outcomes
    assert!(row.fields.contains_key("completed_at"));
    assert!(row.fields.contains_key("rejected_at"));

    assert_eq!(h.store.row_count(tables::USER_AGENTS).await, 0);
    assert_eq!(h.store.row_count(tables::USERS).await, 0);
    assert_eq!(h.store.row_count(tables::REWARD_GRANTS).await, 0);

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        SentNote::Rejection { user_id, title } => {
            assert_eq!(user_id, "u-1");
            assert_eq!(title, "Host a community call");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn notification_failure_never_fails_the_operation() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!(50)).await;
    seed_submission(&h.store, "u-1", mission_id).await;
    h.notifier.set_fail(true).await;

    let outcome = h.engine.approve(&request("u-1", mission_id)).await;
    assert!(outcome.is_ok(), "delivery failure must not surface");

    // The transition and rewards still committed
    let agent = h.store.get(tables::USER_AGENTS, 1).await.unwrap();
    assert_eq!(agent.fields["total_xp"], json!(50));
}

#[tokio::test]
async fn store_failure_surfaces_as_dependency_error() {
    let h = harness();
    h.store.set_fail_on_fetch(true).await;

    let err = h.engine.approve(&request("u-1", 1)).await.unwrap_err();
    assert!(matches!(err, EngineError::Dependency(_)));
}

#[tokio::test]
async fn validation_precedes_store_traffic() {
    let h = harness();
    // A broken store is never touched when the request is malformed
    h.store.set_fail_on_fetch(true).await;

    let req = ReviewRequest {
        user_id: "u-1".to_string(),
        mission_id: "not-a-number".to_string(),
        reviewer_id: None,
    };
    let err = h.engine.approve(&req).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn pending_submissions_lists_review_queue() {
    let h = harness();
    let mission_id = seed_mission(&h.store, json!(50)).await;
    seed_submission(&h.store, "u-1", mission_id).await;
    seed_submission(&h.store, "u-2", mission_id).await;
    h.store
        .seed(
            tables::USER_MISSIONS,
            fields(&[
                ("user_id", json!("u-3")),
                ("mission_id", json!(mission_id)),
                ("status", json!("completed")),
            ]),
        )
        .await;

    let pending = h.engine.pending_submissions().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|p| p.status.as_str() == "submitted"));
}
