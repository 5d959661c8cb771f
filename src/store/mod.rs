//! Record store boundary.
//!
//! This module contains:
//! - `RecordStore` trait: tabular fetch/insert/update against the hosted
//!   record store
//! - `RawRecord`/`Filter` types: the opaque wire-level shapes
//! - Implementations: Grist (HTTP), Mock (in-memory)
//!
//! The store enforces no schema and offers no multi-statement atomicity;
//! everything above this seam must coerce field types defensively and
//! treat multi-step writes as best-effort sagas.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

pub mod grist;
pub mod mock;

pub use grist::{GristConfig, GristStore};
pub use mock::MockRecordStore;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("store response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{table} record {id} is malformed: {reason}")]
    Malformed {
        table: &'static str,
        id: i64,
        reason: String,
    },

    #[error("store misconfigured: {0}")]
    Config(String),
}

/// Field map for a single record. Values are opaque JSON: the store may
/// hand back a number where a string was written and vice versa.
pub type FieldMap = serde_json::Map<String, Value>;

/// A record as returned by the store: a store-assigned row id plus
/// untyped fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: i64,
    pub fields: FieldMap,
}

/// A partial update for a single record.
#[derive(Debug, Clone)]
pub struct RecordUpdate {
    pub id: i64,
    pub fields: FieldMap,
}

/// Equality filter over record fields: column -> accepted values.
///
/// Matches the store's native filter encoding, and doubles as the match
/// predicate for the in-memory mock.
#[derive(Debug, Clone, Default)]
pub struct Filter(BTreeMap<String, Vec<Value>>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column` to equal `value`.
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.0
            .entry(column.to_string())
            .or_default()
            .push(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as the store's JSON filter parameter.
    pub fn to_json(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .0
            .iter()
            .map(|(column, values)| (column.clone(), Value::Array(values.clone())))
            .collect();
        Value::Object(map)
    }

    /// Whether a record's fields satisfy every column constraint.
    pub fn matches(&self, fields: &FieldMap) -> bool {
        self.0.iter().all(|(column, accepted)| {
            fields
                .get(column)
                .map(|actual| accepted.iter().any(|v| v == actual))
                .unwrap_or(false)
        })
    }
}

/// Interface to the hosted record store.
///
/// Implementations:
/// - `GristStore`: HTTP client for a hosted Grist document
/// - `MockRecordStore`: In-memory store for testing
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch records from a table, optionally filtered by field equality.
    async fn fetch_table(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<RawRecord>>;

    /// Insert records, returning the store-assigned ids in input order.
    async fn add_records(&self, table: &str, records: Vec<FieldMap>) -> Result<Vec<i64>>;

    /// Partially update records by id. The store offers no
    /// optimistic-concurrency token; callers serialize conflicting
    /// writes themselves.
    async fn update_records(&self, table: &str, updates: Vec<RecordUpdate>) -> Result<()>;
}
