//! Grist record store client.
//!
//! Speaks the Grist REST records API for a single document. Reads are
//! retried with bounded backoff on transient transport failures; writes
//! are issued exactly once because the store offers no idempotency token.

use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{FieldMap, Filter, RawRecord, RecordStore, RecordUpdate, Result, StoreError};
use crate::utils::retry::{is_transient, is_transient_status, read_backoff};

/// Connection settings for a hosted Grist document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GristConfig {
    /// Base URL of the Grist server, e.g. `https://docs.getgrist.com`.
    pub base_url: String,
    /// Document id the tables live in.
    pub doc_id: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GristConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            doc_id: String::new(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// HTTP implementation of [`RecordStore`] against the Grist records API.
pub struct GristStore {
    client: Client,
    config: GristConfig,
}

/// Wire shape of a records response.
#[derive(Debug, Deserialize)]
struct RecordsEnvelope {
    records: Vec<WireRecord>,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: i64,
    #[serde(default)]
    fields: FieldMap,
}

impl GristStore {
    pub fn new(config: GristConfig) -> Result<Self> {
        if config.base_url.is_empty() || config.doc_id.is_empty() {
            return Err(StoreError::Config(
                "grist base_url and doc_id must be set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn records_url(&self, table: &str) -> String {
        format!(
            "{}/api/docs/{}/tables/{}/records",
            self.config.base_url.trim_end_matches('/'),
            self.config.doc_id,
            table
        )
    }

    async fn get_records(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<RawRecord>> {
        let mut request = self
            .client
            .get(self.records_url(table))
            .bearer_auth(&self.config.api_key);

        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            request = request.query(&[("filter", filter.to_json().to_string())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let envelope: RecordsEnvelope = response.json().await?;
        debug!(table, count = envelope.records.len(), "fetched records");
        Ok(envelope
            .records
            .into_iter()
            .map(|r| RawRecord {
                id: r.id,
                fields: r.fields,
            })
            .collect())
    }

    async fn send_write(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.config.api_key).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RecordStore for GristStore {
    async fn fetch_table(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<RawRecord>> {
        // Fetches are idempotent, so transient transport failures are
        // retried with bounded backoff. Writes never are.
        (|| async { self.get_records(table, filter).await })
            .retry(read_backoff())
            .when(|e| match e {
                StoreError::Http(err) => is_transient(err),
                StoreError::Status { status, .. } => is_transient_status(*status),
                _ => false,
            })
            .notify(|err, dur| {
                warn!(table, error = %err, retry_in = ?dur, "transient store read failure");
            })
            .await
    }

    async fn add_records(&self, table: &str, records: Vec<FieldMap>) -> Result<Vec<i64>> {
        let body = json!({
            "records": records
                .into_iter()
                .map(|fields| json!({ "fields": Value::Object(fields) }))
                .collect::<Vec<_>>(),
        });

        let response = self
            .send_write(self.client.post(self.records_url(table)).json(&body))
            .await?;

        let envelope: RecordsEnvelope = response.json().await?;
        Ok(envelope.records.into_iter().map(|r| r.id).collect())
    }

    async fn update_records(&self, table: &str, updates: Vec<RecordUpdate>) -> Result<()> {
        let body = json!({
            "records": updates
                .into_iter()
                .map(|u| json!({ "id": u.id, "fields": Value::Object(u.fields) }))
                .collect::<Vec<_>>(),
        });

        self.send_write(self.client.patch(self.records_url(table)).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_url() {
        let store = GristStore::new(GristConfig {
            base_url: "https://grist.example.com/".to_string(),
            doc_id: "abc123".to_string(),
            api_key: "key".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            store.records_url("Missions"),
            "https://grist.example.com/api/docs/abc123/tables/Missions/records"
        );
    }

    #[test]
    fn test_empty_config_rejected() {
        assert!(GristStore::new(GristConfig::default()).is_err());
    }
}
