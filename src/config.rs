//! Engine configuration.
//!
//! Supports YAML file and environment variable overrides.

use std::path::Path;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::notify::DiscordConfig;
use crate::store::GristConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store connection.
    pub store: GristConfig,
    /// Reward components issued on approval.
    pub rewards: RewardPolicy,
    /// Outcome notification delivery.
    pub notify: DiscordConfig,
    /// Aggregation settings.
    pub rollup: RollupConfig,
}

/// Reward components issued when a mission is approved.
///
/// XP comes from the mission catalog; health and credits are policy.
/// Credits default to tracking XP one-to-one but are independently
/// tunable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Health added per approval, before clamping to [0, 100].
    pub health_bonus: i64,
    /// Credits granted per XP point.
    pub credit_rate: f64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            health_bonus: 10,
            credit_rate: 1.0,
        }
    }
}

impl RewardPolicy {
    /// Credits to grant alongside an XP amount.
    pub fn credits_for(&self, xp: i64) -> i64 {
        (xp as f64 * self.credit_rate).round() as i64
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RollupConfig {
    /// Reference timezone for calendar-period keys, as whole hours east
    /// of UTC.
    pub utc_offset_hours: i32,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self { utc_offset_hours: 0 }
    }
}

impl RollupConfig {
    /// The reference timezone as a fixed offset. Offsets outside the
    /// valid +/-23h range read as UTC.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("QUESTBOARD_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("QUESTBOARD_GRIST_URL") {
            self.store.base_url = url;
        }
        if let Ok(doc) = std::env::var("QUESTBOARD_GRIST_DOC") {
            self.store.doc_id = doc;
        }
        if let Ok(key) = std::env::var("QUESTBOARD_GRIST_API_KEY") {
            self.store.api_key = key;
        }
        if let Ok(url) = std::env::var("QUESTBOARD_WEBHOOK_URL") {
            self.notify.webhook_url = url;
        }
        if let Ok(offset) = std::env::var("QUESTBOARD_UTC_OFFSET") {
            if let Ok(hours) = offset.parse() {
                self.rollup.utc_offset_hours = hours;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rewards.health_bonus, 10);
        assert_eq!(config.rewards.credits_for(50), 50);
        assert_eq!(config.rollup.utc_offset_hours, 0);
        assert_eq!(config.store.timeout_secs, 10);
    }

    #[test]
    fn test_credit_rate_decouples_credits_from_xp() {
        let policy = RewardPolicy {
            health_bonus: 10,
            credit_rate: 0.5,
        };
        assert_eq!(policy.credits_for(50), 25);
        assert_eq!(policy.credits_for(75), 38);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
store:
  base_url: https://grist.example.com
  doc_id: doc1
  api_key: secret
rewards:
  health_bonus: 5
  credit_rate: 2.0
rollup:
  utc_offset_hours: 9
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.store.doc_id, "doc1");
        assert_eq!(config.rewards.health_bonus, 5);
        assert_eq!(config.rewards.credits_for(10), 20);
        assert_eq!(config.rollup.timezone().local_minus_utc(), 9 * 3600);
    }
}
