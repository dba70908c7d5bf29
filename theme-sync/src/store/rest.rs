use super::{SettingsStore, Subscription};
use crate::common::{SyncError, SyncResult};
use crate::theme::ThemeRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Connection settings for a PostgREST-style settings table.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub request_timeout: Duration,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: "settings".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SettingsRow {
    key: String,
    value: String,
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<SettingsRow> for ThemeRecord {
    fn from(row: SettingsRow) -> Self {
        ThemeRecord {
            key: row.key,
            value: row.value,
            version: row.version.unwrap_or_default(),
            updated_at: row.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Serialize)]
struct UpsertRow<'a> {
    key: &'a str,
    value: &'a str,
}

/// Settings store backed by a hosted database's REST interface.
///
/// Rows are read with `GET /rest/v1/{table}?key=eq.{key}` and written with a
/// merge-duplicates `POST`. The REST interface has no push channel, so
/// [`subscribe`](SettingsStore::subscribe) always fails and contexts using this
/// store run on polling alone.
#[derive(Debug, Clone)]
pub struct RestSettingsStore {
    config: RestStoreConfig,
    http_client: reqwest::Client,
}

impl RestSettingsStore {
    pub fn new(config: RestStoreConfig) -> SyncResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(SyncError::Configuration(
                "REST settings store requires a base URL".to_string(),
            ));
        }
        if config.api_key.trim().is_empty() {
            return Err(SyncError::Configuration(
                "REST settings store requires an API key".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                SyncError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &RestStoreConfig {
        &self.config
    }

    pub(crate) fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
    }

    pub(crate) fn parse_rows(body: &str) -> Result<Vec<ThemeRecord>, serde_json::Error> {
        let rows: Vec<SettingsRow> = serde_json::from_str(body)?;
        Ok(rows.into_iter().map(ThemeRecord::from).collect())
    }
}

#[async_trait]
impl SettingsStore for RestSettingsStore {
    async fn get(&self, key: &str) -> SyncResult<Option<ThemeRecord>> {
        let url = self.table_url();
        log::debug!("Fetching setting '{key}' from {url}");

        let filter = format!("eq.{key}");
        let response = self
            .authorized(self.http_client.get(&url))
            .query(&[("key", filter.as_str()), ("select", "*")])
            .send()
            .await
            .map_err(|e| SyncError::RemoteReadFailure(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SyncError::RemoteReadFailure(format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(SyncError::RemoteReadFailure(format!(
                "Request failed with status {status}: {body}"
            )));
        }

        let mut records = Self::parse_rows(&body).map_err(|e| {
            SyncError::RemoteReadFailure(format!("Failed to parse settings rows: {e}"))
        })?;

        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    async fn upsert(&self, key: &str, value: &str) -> SyncResult<ThemeRecord> {
        let url = self.table_url();
        log::debug!("Upserting setting '{key}' = '{value}' at {url}");

        let response = self
            .authorized(self.http_client.post(&url))
            .query(&[("on_conflict", "key")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[UpsertRow { key, value }])
            .send()
            .await
            .map_err(|e| SyncError::RemoteWriteFailure(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SyncError::RemoteWriteFailure(format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(SyncError::RemoteWriteFailure(format!(
                "Request failed with status {status}: {body}"
            )));
        }

        let mut records = Self::parse_rows(&body).map_err(|e| {
            SyncError::RemoteWriteFailure(format!("Failed to parse upsert response: {e}"))
        })?;

        if records.is_empty() {
            // Backend ignored return=representation
            Ok(ThemeRecord::new(key, value, 0))
        } else {
            Ok(records.swap_remove(0))
        }
    }

    async fn subscribe(&self, key: &str) -> SyncResult<Subscription> {
        Err(SyncError::SubscriptionFailure(format!(
            "REST settings store has no push channel for '{key}'"
        )))
    }

    async fn unsubscribe(&self, _subscription_id: Uuid) -> SyncResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{CURRENT_THEME_KEY, ThemeValue};
    use claims::*;

    fn store(base_url: &str) -> RestSettingsStore {
        let config = RestStoreConfig::new(base_url, "anon-key")
            .with_request_timeout(Duration::from_millis(500));
        assert_ok!(RestSettingsStore::new(config))
    }

    #[test]
    fn test_requires_url_and_key() {
        assert_matches!(
            RestSettingsStore::new(RestStoreConfig::new("", "key")),
            Err(SyncError::Configuration(_))
        );
        assert_matches!(
            RestSettingsStore::new(RestStoreConfig::new("https://example.test", " ")),
            Err(SyncError::Configuration(_))
        );
    }

    #[test]
    fn test_table_url() {
        let store = store("https://project.example.test/");
        assert_eq!(
            store.table_url(),
            "https://project.example.test/rest/v1/settings"
        );

        let config = RestStoreConfig::new("https://project.example.test", "k")
            .with_table("site_settings");
        let store = assert_ok!(RestSettingsStore::new(config));
        assert_eq!(
            store.table_url(),
            "https://project.example.test/rest/v1/site_settings"
        );
    }

    #[test]
    fn test_parse_rows() {
        let body = r#"[{"key":"current_theme","value":"diwali","version":4,"updated_at":"2024-11-01T10:00:00Z","id":17}]"#;
        let records = assert_ok!(RestSettingsStore::parse_rows(body));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, CURRENT_THEME_KEY);
        assert_eq!(records[0].version, 4);
        assert_eq!(assert_ok!(records[0].theme()), ThemeValue::Diwali);
    }

    #[test]
    fn test_parse_rows_without_version_column() {
        let body = r#"[{"key":"current_theme","value":"eid"}]"#;
        let records = assert_ok!(RestSettingsStore::parse_rows(body));
        assert_eq!(records[0].version, 0);

        assert!(assert_ok!(RestSettingsStore::parse_rows("[]")).is_empty());
        assert_err!(RestSettingsStore::parse_rows("{\"message\":\"nope\"}"));
    }

    #[tokio::test]
    async fn test_subscribe_is_unsupported() {
        let store = store("https://project.example.test");
        assert_matches!(
            store.subscribe(CURRENT_THEME_KEY).await,
            Err(SyncError::SubscriptionFailure(_))
        );
        assert_ok!(store.unsubscribe(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_unreachable_backend_maps_to_remote_errors() {
        // Nothing listens on the discard port locally
        let store = store("http://127.0.0.1:9");

        assert_matches!(
            store.get(CURRENT_THEME_KEY).await,
            Err(SyncError::RemoteReadFailure(_))
        );
        assert_matches!(
            store.upsert(CURRENT_THEME_KEY, "holi").await,
            Err(SyncError::RemoteWriteFailure(_))
        );
    }
}
