//! Mock record store for testing.
//!
//! In-memory tables with store-assigned ids and failure-injection
//! toggles. Each trait call is atomic over the table map, mirroring the
//! real store's per-call (but not multi-call) consistency.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{FieldMap, Filter, RawRecord, RecordStore, RecordUpdate, Result, StoreError};

#[derive(Default)]
struct TableData {
    rows: Vec<RawRecord>,
    next_id: i64,
}

/// Mock store keeping all tables in memory.
#[derive(Default)]
pub struct MockRecordStore {
    tables: RwLock<HashMap<String, TableData>>,
    fail_on_fetch: RwLock<bool>,
    fail_on_write: RwLock<bool>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_fetch(&self, fail: bool) {
        *self.fail_on_fetch.write().await = fail;
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    /// Seed a record directly, returning its assigned id.
    pub async fn seed(&self, table: &str, fields: FieldMap) -> i64 {
        let mut tables = self.tables.write().await;
        let data = tables.entry(table.to_string()).or_default();
        data.next_id += 1;
        let id = data.next_id;
        data.rows.push(RawRecord { id, fields });
        id
    }

    /// Read a record back by id, bypassing the trait.
    pub async fn get(&self, table: &str, id: i64) -> Option<RawRecord> {
        let tables = self.tables.read().await;
        tables
            .get(table)
            .and_then(|data| data.rows.iter().find(|r| r.id == id))
            .cloned()
    }

    /// Number of rows currently in a table.
    pub async fn row_count(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table).map(|data| data.rows.len()).unwrap_or(0)
    }

    fn unavailable() -> StoreError {
        StoreError::Status {
            status: 503,
            body: "mock store unavailable".to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn fetch_table(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<RawRecord>> {
        if *self.fail_on_fetch.read().await {
            return Err(Self::unavailable());
        }
        let tables = self.tables.read().await;
        let rows = tables.get(table).map(|data| data.rows.as_slice()).unwrap_or(&[]);
        Ok(rows
            .iter()
            .filter(|r| filter.map(|f| f.matches(&r.fields)).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn add_records(&self, table: &str, records: Vec<FieldMap>) -> Result<Vec<i64>> {
        if *self.fail_on_write.read().await {
            return Err(Self::unavailable());
        }
        let mut tables = self.tables.write().await;
        let data = tables.entry(table.to_string()).or_default();
        let mut ids = Vec::with_capacity(records.len());
        for fields in records {
            data.next_id += 1;
            data.rows.push(RawRecord {
                id: data.next_id,
                fields,
            });
            ids.push(data.next_id);
        }
        Ok(ids)
    }

    async fn update_records(&self, table: &str, updates: Vec<RecordUpdate>) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(Self::unavailable());
        }
        let mut tables = self.tables.write().await;
        let data = tables.entry(table.to_string()).or_default();
        for update in updates {
            let Some(row) = data.rows.iter_mut().find(|r| r.id == update.id) else {
                return Err(StoreError::Status {
                    status: 404,
                    body: format!("no record {} in {}", update.id, table),
                });
            };
            for (key, value) in update.fields {
                row.fields.insert(key, value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, serde_json::Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_add_assigns_sequential_ids() {
        let store = MockRecordStore::new();
        let ids = store
            .add_records(
                "Missions",
                vec![
                    fields(&[("title", json!("one"))]),
                    fields(&[("title", json!("two"))]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_fetch_applies_filter() {
        let store = MockRecordStore::new();
        store
            .seed("UserMissions", fields(&[("user_id", json!("u-1"))]))
            .await;
        store
            .seed("UserMissions", fields(&[("user_id", json!("u-2"))]))
            .await;

        let filter = Filter::new().eq("user_id", "u-2");
        let rows = store
            .fetch_table("UserMissions", Some(&filter))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields["user_id"], json!("u-2"));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MockRecordStore::new();
        let id = store
            .seed(
                "UserMissions",
                fields(&[("status", json!("submitted")), ("notes", json!("n"))]),
            )
            .await;

        store
            .update_records(
                "UserMissions",
                vec![RecordUpdate {
                    id,
                    fields: fields(&[("status", json!("completed"))]),
                }],
            )
            .await
            .unwrap();

        let row = store.get("UserMissions", id).await.unwrap();
        assert_eq!(row.fields["status"], json!("completed"));
        assert_eq!(row.fields["notes"], json!("n"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let store = MockRecordStore::new();
        let result = store
            .update_records(
                "UserMissions",
                vec![RecordUpdate {
                    id: 99,
                    fields: FieldMap::new(),
                }],
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MockRecordStore::new();
        store.set_fail_on_fetch(true).await;
        assert!(store.fetch_table("Missions", None).await.is_err());

        store.set_fail_on_fetch(false).await;
        assert!(store.fetch_table("Missions", None).await.is_ok());
    }
}
