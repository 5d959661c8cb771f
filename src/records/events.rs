//! Raw event rows consumed by the aggregation engine.
//!
//! Timestamps are kept as `Option`: a row whose timestamp is missing or
//! unparsable still parses, and the rollup layer skips it rather than
//! aborting the whole aggregation.

use chrono::{DateTime, Utc};

use super::{field, tables, RecordError};
use crate::store::RawRecord;

/// A credit purchase.
#[derive(Debug, Clone)]
pub struct PurchaseEvent {
    pub user_id: String,
    pub amount: i64,
    pub at: Option<DateTime<Utc>>,
}

impl PurchaseEvent {
    pub fn from_raw(raw: &RawRecord) -> Result<Self, RecordError> {
        let user_id = field::text(&raw.fields, "user_id")
            .ok_or_else(|| RecordError::new(tables::PURCHASES, raw.id, "missing user_id"))?;
        let amount = field::integer(&raw.fields, "amount")
            .ok_or_else(|| RecordError::new(tables::PURCHASES, raw.id, "missing amount"))?;

        Ok(Self {
            user_id,
            amount,
            at: field::timestamp(&raw.fields, "purchased_at"),
        })
    }
}

/// A gacha prize win.
#[derive(Debug, Clone)]
pub struct PrizeWinEvent {
    pub user_id: String,
    pub prize: String,
    pub value: i64,
    pub at: Option<DateTime<Utc>>,
}

impl PrizeWinEvent {
    pub fn from_raw(raw: &RawRecord) -> Result<Self, RecordError> {
        let user_id = field::text(&raw.fields, "user_id")
            .ok_or_else(|| RecordError::new(tables::GACHA_WINS, raw.id, "missing user_id"))?;
        let prize = field::text(&raw.fields, "prize")
            .ok_or_else(|| RecordError::new(tables::GACHA_WINS, raw.id, "missing prize"))?;

        Ok(Self {
            user_id,
            prize,
            value: field::integer(&raw.fields, "value").unwrap_or(0),
            at: field::timestamp(&raw.fields, "won_at"),
        })
    }
}

/// A mission completion, sourced from the reward grant ledger.
#[derive(Debug, Clone)]
pub struct CompletionEvent {
    pub user_id: String,
    pub xp: i64,
    pub at: Option<DateTime<Utc>>,
}

impl From<&super::RewardGrant> for CompletionEvent {
    fn from(grant: &super::RewardGrant) -> Self {
        Self {
            user_id: grant.user_id.clone(),
            xp: grant.xp,
            at: grant.granted_at,
        }
    }
}
