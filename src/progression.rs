//! Progression curves for user agents.
//!
//! Pure functions mapping cumulative XP to level/progress and health to
//! mood. Derived values are recomputed from their sources on every use;
//! nothing here reads or writes stored state.

use serde::{Deserialize, Serialize};

/// XP needed to advance one level. The curve is linear.
pub const XP_PER_LEVEL: i64 = 100;

/// Health ceiling. Health is always clamped to `[0, HEALTH_MAX]`.
pub const HEALTH_MAX: i64 = 100;

/// Level for a cumulative XP total. Level 1 starts at 0 XP.
pub fn level_for_xp(total_xp: i64) -> i64 {
    total_xp / XP_PER_LEVEL + 1
}

/// XP earned within the current level, in `[0, XP_PER_LEVEL)`.
pub fn progress_within_level(total_xp: i64) -> i64 {
    total_xp % XP_PER_LEVEL
}

/// XP still required to reach the next level.
pub fn xp_to_next_level(total_xp: i64) -> i64 {
    XP_PER_LEVEL - progress_within_level(total_xp)
}

/// Whether a grant that moved `old_xp` to `new_xp` crossed a level
/// threshold. Compares the two computed levels, so a single large grant
/// that crosses several thresholds still reads as one level-up.
pub fn leveled_up(old_xp: i64, new_xp: i64) -> bool {
    level_for_xp(new_xp) > level_for_xp(old_xp)
}

/// Snapshot of all level-derived values for a cumulative XP total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelSnapshot {
    pub level: i64,
    pub progress: i64,
    pub xp_required: i64,
}

impl LevelSnapshot {
    pub fn of(total_xp: i64) -> Self {
        Self {
            level: level_for_xp(total_xp),
            progress: progress_within_level(total_xp),
            xp_required: xp_to_next_level(total_xp),
        }
    }
}

/// Clamp a health value into the valid `[0, 100]` range.
pub fn clamp_health(health: i64) -> i64 {
    health.clamp(0, HEALTH_MAX)
}

/// Agent mood, a step function of health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mood for a health value: >= 70 happy, >= 30 neutral, otherwise sad.
pub fn mood_for_health(health: i64) -> Mood {
    if health >= 70 {
        Mood::Happy
    } else if health >= 30 {
        Mood::Neutral
    } else {
        Mood::Sad
    }
}
