use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use theme_sync::context::{DEFAULT_POLL_INTERVAL, SyncOptions};
use theme_sync::reconciler::DEFAULT_GRACE_WINDOW;
use theme_sync::theme::{CURRENT_THEME_KEY, LOCAL_CACHE_KEY};
use theme_sync::clock::duration_millis;
use theme_sync::{FileCache, SyncResult};

/// `[sync]` section: how a mounted context polls and reconciles
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    poll_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grace_window_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_file: Option<PathBuf>,
}

impl SyncConfig {
    /// Every field filled with its built-in default, for the config template
    pub fn with_defaults() -> Self {
        Self {
            poll_interval_ms: Some(duration_millis(DEFAULT_POLL_INTERVAL)),
            grace_window_ms: Some(duration_millis(DEFAULT_GRACE_WINDOW)),
            settings_key: Some(CURRENT_THEME_KEY.to_string()),
            cache_key: Some(LOCAL_CACHE_KEY.to_string()),
            cache_file: None,
        }
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
            .unwrap_or(duration_millis(DEFAULT_POLL_INTERVAL))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms())
    }

    pub fn grace_window_ms(&self) -> u64 {
        self.grace_window_ms
            .unwrap_or(duration_millis(DEFAULT_GRACE_WINDOW))
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms())
    }

    pub fn settings_key(&self) -> &str {
        self.settings_key.as_deref().unwrap_or(CURRENT_THEME_KEY)
    }

    pub fn cache_key(&self) -> &str {
        self.cache_key.as_deref().unwrap_or(LOCAL_CACHE_KEY)
    }

    /// Configured cache file, or the per-user default location
    pub fn cache_file(&self) -> SyncResult<PathBuf> {
        match &self.cache_file {
            Some(path) => Ok(path.clone()),
            None => FileCache::default_path(),
        }
    }

    pub fn to_options(&self) -> SyncOptions {
        SyncOptions {
            poll_interval: self.poll_interval(),
            grace_window: self.grace_window(),
            settings_key: self.settings_key().to_string(),
            cache_key: self.cache_key().to_string(),
        }
    }
}
