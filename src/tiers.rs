//! Loyalty tier classification.
//!
//! Maps a continuous trust score (an externally supplied reputation
//! signal, observed range 0-5+) to a discrete tier plus a sub-level in
//! `[1, 5]`. Display/ranking only: no write effects anywhere downstream.
//!
//! The thresholds are load-bearing for dashboard compatibility and must
//! not drift; see the table in [`classify`].

use serde::{Deserialize, Serialize};

/// Discrete loyalty rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
            Tier::Diamond => "diamond",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier with its sub-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAssignment {
    pub tier: Tier,
    pub tier_level: u8,
}

/// Classify a trust score into a tier and sub-level.
///
/// | trust score | tier | sub-level |
/// |---|---|---|
/// | < 1.0 | bronze | 1 |
/// | [1.0, 2.5) | bronze | ceil((score/1.5)*3), capped at 5 |
/// | [2.5, 3.5) | silver | ceil((score-2.5)*3)+1, capped at 5 |
/// | [3.5, 4.5) | gold | ceil((score-3.5)*3)+1, capped at 5 |
/// | [4.5, 4.8) | platinum | ceil(((score-4.5)/0.3)*2)+2, capped at 5 |
/// | >= 4.8 | diamond | ceil(((score-4.8)/0.2)*2)+3, capped at 5 |
///
/// Total over all inputs: NaN and negative scores classify as 0.
pub fn classify(trust_score: f64) -> TierAssignment {
    let score = if trust_score.is_nan() {
        0.0
    } else {
        trust_score.max(0.0)
    };

    let (tier, raw_level) = if score < 1.0 {
        (Tier::Bronze, 1.0)
    } else if score < 2.5 {
        (Tier::Bronze, ((score / 1.5) * 3.0).ceil())
    } else if score < 3.5 {
        (Tier::Silver, (((score - 2.5) / 1.0) * 3.0).ceil() + 1.0)
    } else if score < 4.5 {
        (Tier::Gold, (((score - 3.5) / 1.0) * 3.0).ceil() + 1.0)
    } else if score < 4.8 {
        (Tier::Platinum, (((score - 4.5) / 0.3) * 2.0).ceil() + 2.0)
    } else {
        (Tier::Diamond, (((score - 4.8) / 0.2) * 2.0).ceil() + 3.0)
    };

    TierAssignment {
        tier,
        tier_level: raw_level.clamp(1.0, 5.0) as u8,
    }
}

/// Classify an optional score; a missing signal reads as 0 (bronze/1).
pub fn classify_or_default(trust_score: Option<f64>) -> TierAssignment {
    classify(trust_score.unwrap_or(0.0))
}
