//! Mission catalog entries.

use serde::Serialize;
use serde_json::Value;

use super::{field, RecordError};
use crate::store::RawRecord;

/// XP granted when a mission has no parsable reward.
pub const DEFAULT_REWARD_XP: i64 = 50;

/// Token symbol of the platform XP currency.
pub const XP_TOKEN: &str = "XP";

/// A mission's reward: an amount of some token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardSpec {
    pub amount: i64,
    pub token: String,
}

impl Default for RewardSpec {
    fn default() -> Self {
        Self {
            amount: DEFAULT_REWARD_XP,
            token: XP_TOKEN.to_string(),
        }
    }
}

impl RewardSpec {
    /// Parse a reward cell.
    ///
    /// Accepts a bare number ("75"), or "amount token" text ("75 QP").
    /// Anything unparsable falls back to the 50-XP default.
    pub fn parse(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };

        match value {
            Value::Number(n) => match n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)) {
                Some(amount) if amount > 0 => Self {
                    amount,
                    token: XP_TOKEN.to_string(),
                },
                _ => Self::default(),
            },
            Value::String(s) => {
                let mut parts = s.split_whitespace();
                let amount = parts.next().and_then(|p| p.parse::<i64>().ok());
                match amount {
                    Some(amount) if amount > 0 => {
                        let token = parts.next().unwrap_or(XP_TOKEN).to_string();
                        Self { amount, token }
                    }
                    _ => Self::default(),
                }
            }
            _ => Self::default(),
        }
    }
}

/// A catalog task users can attempt. Immutable once published.
#[derive(Debug, Clone, Serialize)]
pub struct Mission {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub reward: RewardSpec,
}

impl Mission {
    pub fn from_raw(raw: &RawRecord) -> Result<Self, RecordError> {
        let title = field::text(&raw.fields, "title").ok_or_else(|| {
            RecordError::new(super::tables::MISSIONS, raw.id, "missing title")
        })?;

        Ok(Self {
            id: raw.id,
            title,
            description: field::text(&raw.fields, "description").unwrap_or_default(),
            reward: RewardSpec::parse(raw.fields.get("reward")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reward_parse_number() {
        let value = json!(120);
        let reward = RewardSpec::parse(Some(&value));
        assert_eq!(reward.amount, 120);
        assert_eq!(reward.token, "XP");
    }

    #[test]
    fn test_reward_parse_amount_and_token() {
        let value = json!("75 QP");
        let reward = RewardSpec::parse(Some(&value));
        assert_eq!(reward.amount, 75);
        assert_eq!(reward.token, "QP");
    }

    #[test]
    fn test_reward_unparsable_defaults_to_fifty_xp() {
        for value in [json!("complete this"), json!(""), json!(0), json!(-3), json!(null)] {
            let reward = RewardSpec::parse(Some(&value));
            assert_eq!(reward.amount, DEFAULT_REWARD_XP, "value={value}");
            assert_eq!(reward.token, "XP");
        }
        assert_eq!(RewardSpec::parse(None).amount, DEFAULT_REWARD_XP);
    }

    #[test]
    fn test_mission_from_raw() {
        let mut fields = crate::store::FieldMap::new();
        fields.insert("title".into(), json!("Join the guild"));
        fields.insert("description".into(), json!("Say hello in #general"));
        fields.insert("reward".into(), json!("25 XP"));

        let mission = Mission::from_raw(&RawRecord { id: 4, fields }).unwrap();
        assert_eq!(mission.id, 4);
        assert_eq!(mission.title, "Join the guild");
        assert_eq!(mission.reward.amount, 25);
    }

    #[test]
    fn test_mission_without_title_is_malformed() {
        let raw = RawRecord {
            id: 9,
            fields: crate::store::FieldMap::new(),
        };
        assert!(Mission::from_raw(&raw).is_err());
    }
}
