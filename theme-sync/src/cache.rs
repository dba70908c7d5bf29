//! Local persistent cache used to bootstrap the theme before any remote
//! value is known.
//!
//! The cache is never authoritative: every apply overwrites it and nothing
//! reads it again after startup.

use crate::common::{SyncError, SyncResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Per-installation key/value slot, the analogue of a browser's local storage.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> SyncResult<()>;
}

/// In-process cache, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let cache = Self::new();
        if let Ok(mut entries) = cache.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        cache
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => {
                log::warn!("Memory cache lock poisoned, treating '{key}' as missing");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| SyncError::LocalCache(format!("Memory cache lock poisoned: {e}")))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Cache backed by a small JSON object on disk.
///
/// The file is re-read on every `get` so that several processes sharing it
/// see each other's writes. A missing or unreadable file reads as empty.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<cache dir>/theme-sync/cache.json` for the current platform
    pub fn default_path() -> SyncResult<PathBuf> {
        dirs::cache_dir()
            .map(|mut path| {
                path.push("theme-sync");
                path.push("cache.json");
                path
            })
            .ok_or_else(|| {
                SyncError::Configuration("Unable to determine cache directory".to_string())
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> HashMap<String, String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                log::warn!("Failed to read cache file '{}': {e}", self.path.display());
                return HashMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(
                "Ignoring corrupt cache file '{}': {e}",
                self.path.display()
            );
            HashMap::new()
        })
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        self.read_entries().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| SyncError::LocalCache(format!("File cache lock poisoned: {e}")))?;

        let mut entries = self.read_entries();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SyncError::LocalCache(format!(
                    "Failed to create cache directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }

        let content = serde_json::to_string_pretty(&entries)
            .map_err(|e| SyncError::LocalCache(format!("Failed to encode cache: {e}")))?;
        fs::write(&self.path, content).map_err(|e| {
            SyncError::LocalCache(format!(
                "Failed to write cache file '{}': {e}",
                self.path.display()
            ))
        })
    }
}
