//! Calendar-period rollups for dashboards.
//!
//! Groups raw, append-only event logs (purchases, gacha wins, mission
//! completions) into read-only views. Nothing here writes anywhere, and
//! period status is always derived from the wall clock passed in by the
//! caller, never cached.
//!
//! Failure policy: an event with a missing or unparsable timestamp is
//! skipped, not fatal to the whole rollup.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;

mod campaigns;
mod leaderboard;
mod spending;

pub use campaigns::{campaign_periods, CampaignPeriod, CampaignWinner};
pub use leaderboard::{leaderboard_periods, LeaderboardEntry, PeriodLeaderboard};
pub use spending::{spending_summary, SpendingRecord, TrustScoreSource};

/// Lifecycle of a period relative to the wall clock at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Upcoming,
    Active,
    Completed,
}

/// Calendar year-month key in the platform's reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    /// Period an instant falls in, under the reference timezone.
    pub fn of(at: DateTime<Utc>, tz: FixedOffset) -> Self {
        let local = at.with_timezone(&tz);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First instant of the period, as UTC.
    pub fn start_utc(&self, tz: FixedOffset) -> DateTime<Utc> {
        // month always comes from chrono and is in 1..=12, so the
        // fallback date is unreachable
        let midnight = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_default()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default();
        Utc.from_utc_datetime(&(midnight - tz))
    }

    /// Last in-period instant (one second before the next period opens).
    pub fn end_utc(&self, tz: FixedOffset) -> DateTime<Utc> {
        self.next().start_utc(tz) - Duration::seconds(1)
    }

    pub fn status(&self, now: DateTime<Utc>, tz: FixedOffset) -> PeriodStatus {
        if now < self.start_utc(tz) {
            PeriodStatus::Upcoming
        } else if now >= self.next().start_utc(tz) {
            PeriodStatus::Completed
        } else {
            PeriodStatus::Active
        }
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn tz(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_period_key_respects_reference_timezone() {
        // 23:30 UTC on Jan 31 is already February at UTC+9
        let at = utc("2026-01-31T23:30:00Z");
        assert_eq!(PeriodKey::of(at, tz(0)), PeriodKey { year: 2026, month: 1 });
        assert_eq!(PeriodKey::of(at, tz(9)), PeriodKey { year: 2026, month: 2 });
    }

    #[test]
    fn test_period_bounds() {
        let key = PeriodKey { year: 2026, month: 1 };
        assert_eq!(key.start_utc(tz(0)), utc("2026-01-01T00:00:00Z"));
        assert_eq!(key.end_utc(tz(0)), utc("2026-01-31T23:59:59Z"));
        // Offset shifts the UTC instant of the local midnight
        assert_eq!(key.start_utc(tz(9)), utc("2025-12-31T15:00:00Z"));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let key = PeriodKey { year: 2025, month: 12 };
        assert_eq!(key.next(), PeriodKey { year: 2026, month: 1 });
    }

    #[test]
    fn test_status_from_wall_clock() {
        let key = PeriodKey { year: 2026, month: 6 };
        let zone = tz(0);
        assert_eq!(key.status(utc("2026-05-31T23:59:59Z"), zone), PeriodStatus::Upcoming);
        assert_eq!(key.status(utc("2026-06-01T00:00:00Z"), zone), PeriodStatus::Active);
        assert_eq!(key.status(utc("2026-06-30T23:59:59Z"), zone), PeriodStatus::Active);
        assert_eq!(key.status(utc("2026-07-01T00:00:00Z"), zone), PeriodStatus::Completed);
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = PeriodKey { year: 2025, month: 12 };
        let b = PeriodKey { year: 2026, month: 1 };
        let c = PeriodKey { year: 2026, month: 2 };
        assert!(a < b && b < c);
    }
}
