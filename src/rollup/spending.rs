//! Per-user credit spending summaries.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::records::PurchaseEvent;
use crate::tiers::{classify_or_default, TierAssignment};

/// External reputation lookup, keyed by user id.
///
/// A missing score classifies as 0 (bronze/1); the engine never invents
/// trust values.
pub trait TrustScoreSource {
    fn trust_score(&self, user_id: &str) -> Option<f64>;
}

impl TrustScoreSource for HashMap<String, f64> {
    fn trust_score(&self, user_id: &str) -> Option<f64> {
        self.get(user_id).copied()
    }
}

/// One user's spending history, with their loyalty tier attached.
#[derive(Debug, Clone, Serialize)]
pub struct SpendingRecord {
    pub user_id: String,
    pub total_spent: i64,
    pub purchase_count: usize,
    /// Rounded mean purchase amount.
    pub average_purchase: i64,
    pub last_purchase_at: DateTime<Utc>,
    pub tier: TierAssignment,
}

#[derive(Default)]
struct Accum {
    total: i64,
    count: usize,
    latest: Option<DateTime<Utc>>,
}

/// Summarize purchases per user, biggest spender first.
pub fn spending_summary(
    purchases: &[PurchaseEvent],
    scores: &dyn TrustScoreSource,
) -> Vec<SpendingRecord> {
    let mut accum: BTreeMap<&str, Accum> = BTreeMap::new();
    for purchase in purchases {
        let Some(at) = purchase.at else {
            debug!(user_id = %purchase.user_id, "skipping purchase without timestamp");
            continue;
        };
        let entry = accum.entry(purchase.user_id.as_str()).or_default();
        entry.total += purchase.amount;
        entry.count += 1;
        entry.latest = Some(entry.latest.map_or(at, |prev| prev.max(at)));
    }

    let mut records: Vec<SpendingRecord> = accum
        .into_iter()
        .filter_map(|(user_id, acc)| {
            let last_purchase_at = acc.latest?;
            Some(SpendingRecord {
                user_id: user_id.to_string(),
                total_spent: acc.total,
                purchase_count: acc.count,
                average_purchase: (acc.total as f64 / acc.count as f64).round() as i64,
                last_purchase_at,
                tier: classify_or_default(scores.trust_score(user_id)),
            })
        })
        .collect();

    // Descending by spend; user id breaks ties so output is stable
    records.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    records
}
