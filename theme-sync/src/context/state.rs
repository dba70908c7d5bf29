use crate::clock::Clock;
use crate::reconciler::{ReconcileOutcome, Reconciler, UpdateSource};
use crate::store::SettingsStore;
use crate::theme::{ThemeRecord, ThemeValue};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// State shared between a context handle and its listener tasks.
///
/// The reconciler lock is only ever held for a synchronous decision and the
/// publish that follows it, never across an await, so reconcile calls from
/// different listeners run one at a time and the last one to run wins on
/// both `current()` and the watch channel.
pub(crate) struct SharedState {
    reconciler: Mutex<Reconciler>,
    clock: Arc<dyn Clock>,
    theme_tx: watch::Sender<ThemeValue>,
    settings_key: String,
}

impl SharedState {
    pub(crate) fn new(reconciler: Reconciler, clock: Arc<dyn Clock>, settings_key: String) -> Self {
        let (theme_tx, _) = watch::channel(reconciler.current());
        Self {
            reconciler: Mutex::new(reconciler),
            clock,
            theme_tx,
            settings_key,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Reconciler> {
        // A panic inside a decision leaves the state consistent enough to keep
        // serving the last applied value
        self.reconciler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    pub(crate) fn settings_key(&self) -> &str {
        &self.settings_key
    }

    pub(crate) fn current(&self) -> ThemeValue {
        self.lock().current()
    }

    pub(crate) fn last_local_update(&self) -> Option<u64> {
        self.lock().last_local_update()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ThemeValue> {
        self.theme_tx.subscribe()
    }

    pub(crate) fn reconcile(&self, candidate: &str, source: UpdateSource) -> ReconcileOutcome {
        let now = self.now();
        let mut reconciler = self.lock();
        let outcome = reconciler.reconcile(candidate, source, now);
        self.publish(&reconciler);
        outcome
    }

    pub(crate) fn reconcile_record(
        &self,
        record: &ThemeRecord,
        source: UpdateSource,
    ) -> ReconcileOutcome {
        let now = self.now();
        let mut reconciler = self.lock();
        let outcome = reconciler.reconcile_record(record, source, now);
        self.publish(&reconciler);
        outcome
    }

    pub(crate) fn apply_manual(&self, theme: ThemeValue) {
        let now = self.now();
        let mut reconciler = self.lock();
        reconciler.apply_manual(theme, now);
        self.publish(&reconciler);
    }

    pub(crate) fn observe_version(&self, version: u64) {
        self.lock().observe_version(version);
    }

    /// Read the remote record and reconcile it. A failed read is logged and
    /// treated as having no candidate.
    pub(crate) async fn fetch_and_reconcile(
        &self,
        store: &dyn SettingsStore,
        source: UpdateSource,
    ) -> Option<ReconcileOutcome> {
        match store.get(&self.settings_key).await {
            Ok(Some(record)) => Some(self.reconcile_record(&record, source)),
            Ok(None) => {
                log::debug!("No remote '{}' record yet ({source})", self.settings_key);
                None
            }
            Err(e) => {
                log::warn!("{source} failed, keeping current theme: {e}");
                None
            }
        }
    }

    /// Push the reconciler's current theme to watchers. Called with the
    /// guard held so the last decision is also the last value published.
    fn publish(&self, reconciler: &Reconciler) {
        let theme = reconciler.current();
        self.theme_tx.send_if_modified(|shown| {
            if *shown == theme {
                false
            } else {
                *shown = theme;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::clock::ManualClock;
    use crate::theme::CURRENT_THEME_KEY;

    fn shared_state() -> Arc<SharedState> {
        let reconciler = Reconciler::new(ThemeValue::Default, Arc::new(MemoryCache::new()));
        Arc::new(SharedState::new(
            reconciler,
            Arc::new(ManualClock::new(0)),
            CURRENT_THEME_KEY.to_string(),
        ))
    }

    #[test]
    fn test_watch_tracks_current_under_contention() {
        let state = shared_state();
        let themes = state.subscribe();

        for _ in 0..200 {
            std::thread::scope(|scope| {
                for candidate in ["holi", "eid"] {
                    let state = &state;
                    scope.spawn(move || {
                        for _ in 0..50 {
                            state.reconcile(candidate, UpdateSource::CrossTabBroadcast);
                        }
                    });
                }
            });
            assert_eq!(*themes.borrow(), state.current());
        }
    }

    #[test]
    fn test_ignored_candidate_publishes_nothing() {
        let state = shared_state();
        let mut themes = state.subscribe();
        state.apply_manual(ThemeValue::Christmas);
        assert!(themes.has_changed().unwrap());
        themes.borrow_and_update();

        state.reconcile("eid", UpdateSource::PeriodicPoll);
        assert!(!themes.has_changed().unwrap());
        assert_eq!(*themes.borrow(), ThemeValue::Christmas);
    }
}
