//! Monthly mission leaderboards.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::debug;

use super::{PeriodKey, PeriodStatus};
use crate::records::CompletionEvent;

/// One user's standing within a period.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub missions_completed: usize,
    pub xp_earned: i64,
}

/// Ranked mission completions for one calendar month.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodLeaderboard {
    pub period: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: PeriodStatus,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Default)]
struct Standing {
    completions: usize,
    xp: i64,
}

/// Rank mission completions per month by XP earned, most recent period
/// first.
pub fn leaderboard_periods(
    completions: &[CompletionEvent],
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Vec<PeriodLeaderboard> {
    let mut by_period: BTreeMap<PeriodKey, BTreeMap<&str, Standing>> = BTreeMap::new();
    for completion in completions {
        let Some(at) = completion.at else {
            debug!(user_id = %completion.user_id, "skipping completion without timestamp");
            continue;
        };
        let standing = by_period
            .entry(PeriodKey::of(at, tz))
            .or_default()
            .entry(completion.user_id.as_str())
            .or_default();
        standing.completions += 1;
        standing.xp += completion.xp;
    }

    by_period
        .into_iter()
        .rev()
        .map(|(key, standings)| {
            let mut ranked: Vec<(&str, Standing)> = standings.into_iter().collect();
            ranked.sort_by(|(a_id, a), (b_id, b)| b.xp.cmp(&a.xp).then_with(|| a_id.cmp(b_id)));

            let entries = ranked
                .into_iter()
                .enumerate()
                .map(|(idx, (user_id, standing))| LeaderboardEntry {
                    rank: idx + 1,
                    user_id: user_id.to_string(),
                    missions_completed: standing.completions,
                    xp_earned: standing.xp,
                })
                .collect();

            PeriodLeaderboard {
                period: key.label(),
                starts_at: key.start_utc(tz),
                ends_at: key.end_utc(tz),
                status: key.status(now, tz),
                entries,
            }
        })
        .collect()
}
