use serde::{Deserialize, Serialize};
use std::time::Duration;
use theme_sync::RestStoreConfig;

const DEFAULT_TABLE: &str = "settings";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Which settings store the host talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local store, useful for trying the CLI without a server
    #[default]
    Memory,
    /// PostgREST-style HTTP endpoint
    Rest,
}

/// `[backend]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<BackendKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
}

impl BackendConfig {
    pub fn with_defaults() -> Self {
        Self {
            kind: Some(BackendKind::Memory),
            url: None,
            api_key: None,
            table: Some(DEFAULT_TABLE.to_string()),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind.unwrap_or_default()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn table(&self) -> &str {
        self.table.as_deref().unwrap_or(DEFAULT_TABLE)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// REST connection settings, `None` when `url` or `api_key` is missing
    pub fn rest_config(&self) -> Option<RestStoreConfig> {
        let url = self.url()?;
        let api_key = self.api_key()?;
        Some(
            RestStoreConfig::new(url, api_key)
                .with_table(self.table())
                .with_request_timeout(Duration::from_secs(self.request_timeout_secs())),
        )
    }
}
