//! Remote settings store abstraction.
//!
//! The store holds one keyed row per setting. Contexts read it once at mount,
//! poll it, listen to its push channel and upsert it after manual changes.
//! Any number of contexts may write the same row; the store's version counter
//! is the only ordering it provides.

pub mod memory;
pub mod rest;

use crate::common::SyncResult;
use crate::theme::ThemeRecord;
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

pub use memory::InMemorySettingsStore;
pub use rest::{RestSettingsStore, RestStoreConfig};

/// Live change feed for one key.
///
/// Dropping the subscription closes the receiver; stores prune closed
/// subscribers lazily. Call [`SettingsStore::unsubscribe`] to release it
/// eagerly.
#[derive(Debug)]
pub struct Subscription {
    pub id: Uuid,
    pub key: String,
    pub changes: UnboundedReceiver<ThemeRecord>,
}

/// Request/response and push access to the remote settings table.
///
/// # Examples
///
/// ```no_run
/// use theme_sync::store::{InMemorySettingsStore, SettingsStore};
///
/// # async fn example() -> theme_sync::common::SyncResult<()> {
/// let store = InMemorySettingsStore::new();
/// store.upsert("current_theme", "diwali").await?;
///
/// let record = store.get("current_theme").await?;
/// assert_eq!(record.map(|r| r.value), Some("diwali".to_string()));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the row for `key`, `None` if it has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RemoteReadFailure`](crate::common::SyncError::RemoteReadFailure)
    /// when the store cannot be reached or answers with something unreadable.
    async fn get(&self, key: &str) -> SyncResult<Option<ThemeRecord>>;

    /// Insert or update the row for `key`, returning the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RemoteWriteFailure`](crate::common::SyncError::RemoteWriteFailure).
    async fn upsert(&self, key: &str, value: &str) -> SyncResult<ThemeRecord>;

    /// Open a push channel for changes to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SubscriptionFailure`](crate::common::SyncError::SubscriptionFailure)
    /// when the store has no push channel or it cannot be opened.
    async fn subscribe(&self, key: &str) -> SyncResult<Subscription>;

    async fn unsubscribe(&self, subscription_id: Uuid) -> SyncResult<()>;
}
