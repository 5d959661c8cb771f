//! Monthly campaign rollups.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::debug;

use super::{PeriodKey, PeriodStatus};
use crate::records::{PrizeWinEvent, PurchaseEvent};

/// A prize winner, annotated with the size of the field they beat.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignWinner {
    pub user_id: String,
    pub prize: String,
    pub value: i64,
    pub won_at: DateTime<Utc>,
    /// Distinct purchasers in the winner's period. Filled in only after
    /// participant counting for the period has finished.
    pub total_participants: usize,
}

/// One calendar month of campaign activity.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignPeriod {
    pub period: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: PeriodStatus,
    pub participants: Vec<String>,
    pub total_participants: usize,
    pub total_spent: i64,
    pub winners: Vec<CampaignWinner>,
}

#[derive(Default)]
struct Accum {
    participants: BTreeSet<String>,
    total_spent: i64,
}

/// Roll purchases and prize wins up into monthly campaign views,
/// most recent period first.
///
/// Two passes: participants and spend are counted for every period
/// before any winner is emitted, so each winner's `total_participants`
/// reflects their own period's final count.
pub fn campaign_periods(
    purchases: &[PurchaseEvent],
    wins: &[PrizeWinEvent],
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Vec<CampaignPeriod> {
    let mut accum: BTreeMap<PeriodKey, Accum> = BTreeMap::new();
    for purchase in purchases {
        let Some(at) = purchase.at else {
            debug!(user_id = %purchase.user_id, "skipping purchase without timestamp");
            continue;
        };
        let entry = accum.entry(PeriodKey::of(at, tz)).or_default();
        entry.participants.insert(purchase.user_id.clone());
        entry.total_spent += purchase.amount;
    }

    let mut wins_by_period: BTreeMap<PeriodKey, Vec<&PrizeWinEvent>> = BTreeMap::new();
    for win in wins {
        let Some(at) = win.at else {
            debug!(user_id = %win.user_id, "skipping prize win without timestamp");
            continue;
        };
        wins_by_period
            .entry(PeriodKey::of(at, tz))
            .or_default()
            .push(win);
    }

    // Participant counting is complete; winners may now be emitted.
    let mut keys: BTreeSet<PeriodKey> = accum.keys().copied().collect();
    keys.extend(wins_by_period.keys().copied());

    keys.into_iter()
        .rev()
        .map(|key| {
            let empty = Accum::default();
            let period = accum.get(&key).unwrap_or(&empty);
            let total_participants = period.participants.len();

            let winners = wins_by_period
                .get(&key)
                .map(|wins| {
                    wins.iter()
                        .filter_map(|win| {
                            win.at.map(|won_at| CampaignWinner {
                                user_id: win.user_id.clone(),
                                prize: win.prize.clone(),
                                value: win.value,
                                won_at,
                                total_participants,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();

            CampaignPeriod {
                period: key.label(),
                starts_at: key.start_utc(tz),
                ends_at: key.end_utc(tz),
                status: key.status(now, tz),
                participants: period.participants.iter().cloned().collect(),
                total_participants,
                total_spent: period.total_spent,
                winners,
            }
        })
        .collect()
}
