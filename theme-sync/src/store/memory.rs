use super::{SettingsStore, Subscription};
use crate::common::{SyncError, SyncResult};
use crate::theme::ThemeRecord;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

struct Subscriber {
    id: Uuid,
    key: String,
    sender: UnboundedSender<ThemeRecord>,
}

#[derive(Default)]
struct FailureSwitches {
    reads: AtomicBool,
    writes: AtomicBool,
    subscriptions: AtomicBool,
}

/// Settings store living in process memory.
///
/// Cloning shares the underlying table, so several contexts built from clones
/// behave like browser tabs talking to the same backend. Every upsert bumps
/// the row's version and is pushed to all subscribers of that key, the writer
/// included.
#[derive(Clone, Default)]
pub struct InMemorySettingsStore {
    records: Arc<RwLock<HashMap<String, ThemeRecord>>>,
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    failures: Arc<FailureSwitches>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one row at version 1
    pub async fn seeded(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .records
            .write()
            .await
            .insert(key.to_string(), ThemeRecord::new(key, value, 1));
        store
    }

    /// Make every `get` fail until switched back.
    pub fn fail_reads(&self, fail: bool) {
        self.failures.reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `upsert` fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.failures.writes.store(fail, Ordering::SeqCst);
    }

    /// Make every `subscribe` fail until switched back.
    pub fn fail_subscriptions(&self, fail: bool) {
        self.failures.subscriptions.store(fail, Ordering::SeqCst);
    }

    pub async fn subscriber_count(&self, key: &str) -> usize {
        self.subscribers
            .read()
            .await
            .iter()
            .filter(|s| s.key == key && !s.sender.is_closed())
            .count()
    }

    /// Overwrite a row without notifying subscribers, as a writer bypassing
    /// the push channel would.
    pub async fn write_silently(&self, key: &str, value: &str) -> ThemeRecord {
        let mut records = self.records.write().await;
        let version = records.get(key).map_or(1, |r| r.version + 1);
        let record = ThemeRecord::new(key, value, version);
        records.insert(key.to_string(), record.clone());
        record
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self, key: &str) -> SyncResult<Option<ThemeRecord>> {
        if self.failures.reads.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteReadFailure(format!(
                "simulated read failure for '{key}'"
            )));
        }
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn upsert(&self, key: &str, value: &str) -> SyncResult<ThemeRecord> {
        if self.failures.writes.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteWriteFailure(format!(
                "simulated write failure for '{key}'"
            )));
        }

        let record = {
            let mut records = self.records.write().await;
            match records.get_mut(key) {
                Some(existing) => {
                    existing.value = value.to_string();
                    existing.version += 1;
                    existing.updated_at = Utc::now();
                    existing.clone()
                }
                None => {
                    let record = ThemeRecord::new(key, value, 1);
                    records.insert(key.to_string(), record.clone());
                    record
                }
            }
        };

        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|s| !s.sender.is_closed());
        for subscriber in subscribers.iter().filter(|s| s.key == key) {
            if subscriber.sender.send(record.clone()).is_err() {
                log::debug!("Subscriber {} went away during notify", subscriber.id);
            }
        }

        Ok(record)
    }

    async fn subscribe(&self, key: &str) -> SyncResult<Subscription> {
        if self.failures.subscriptions.load(Ordering::SeqCst) {
            return Err(SyncError::SubscriptionFailure(format!(
                "simulated subscription failure for '{key}'"
            )));
        }

        let (sender, changes) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.write().await.push(Subscriber {
            id,
            key: key.to_string(),
            sender,
        });
        log::debug!("Subscription {id} opened for '{key}'");

        Ok(Subscription {
            id,
            key: key.to_string(),
            changes,
        })
    }

    async fn unsubscribe(&self, subscription_id: Uuid) -> SyncResult<()> {
        self.subscribers
            .write()
            .await
            .retain(|s| s.id != subscription_id);
        log::debug!("Subscription {subscription_id} closed");
        Ok(())
    }
}
