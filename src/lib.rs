//! Questboard - Mission Lifecycle & Rewards Progression Engine
//!
//! Core engine behind a community platform's admin dashboard: moves
//! user-submitted missions through their lifecycle, computes XP/level/
//! health/mood progression, classifies spenders into loyalty tiers, and
//! rolls up raw event records into calendar-period views.
//!
//! The HTTP shell, UI, and the live record store / Discord services are
//! external collaborators: they reach the engine through the types in
//! [`engine`] and the traits in [`store`] and [`notify`].

pub mod config;
pub mod engine;
pub mod notify;
pub mod progression;
pub mod records;
pub mod repository;
pub mod rollup;
pub mod store;
pub mod tiers;
pub mod utils;

pub use config::Config;
pub use engine::{EngineError, MissionEngine, ReviewRequest};
pub use rollup::{campaign_periods, leaderboard_periods, spending_summary};
pub use tiers::{classify, Tier, TierAssignment};
