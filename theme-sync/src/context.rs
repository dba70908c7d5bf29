//! # Theme Context
//!
//! A [`ThemeContext`] is one mounted consumer of the storefront theme, the
//! equivalent of a browser tab. Mounting it bootstraps the theme from the
//! local cache and starts four input streams that all feed the same
//! [`Reconciler`]:
//!
//! - **Initial fetch** - one read of the remote record right after mount
//! - **Push notifications** - the store's change feed, when it has one
//! - **Periodic poll** - a read every `poll_interval` for as long as the
//!   context is mounted
//! - **Cross-tab broadcasts** - manual changes made in sibling contexts
//!
//! ## Manual Changes
//!
//! [`ThemeContext::set_theme`] applies the new theme locally before any I/O,
//! tells sibling contexts, then upserts the remote record. A failed upsert is
//! reported through [`SetThemeResult::error`] but the local change stays.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use theme_sync::{
//!     CrossTabChannel, InMemorySettingsStore, MemoryCache, SyncOptions, ThemeContext,
//!     ThemeSyncDeps, ThemeValue,
//! };
//!
//! # async fn example() -> theme_sync::common::SyncResult<()> {
//! let store = Arc::new(InMemorySettingsStore::new());
//! let bus = CrossTabChannel::new();
//!
//! let deps = ThemeSyncDeps::new(store, Arc::new(MemoryCache::new()), bus.endpoint());
//! let context = ThemeContext::mount(deps, SyncOptions::default()).await?;
//!
//! let result = context.set_theme(ThemeValue::Diwali).await;
//! assert!(result.success);
//! assert_eq!(context.current_theme(), ThemeValue::Diwali);
//!
//! context.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod listeners;
mod state;

use crate::cache::LocalCache;
use crate::clock::{Clock, MonotonicClock};
use crate::common::{SyncError, SyncResult};
use crate::cross_tab::CrossTabEndpoint;
use crate::reconciler::{DEFAULT_GRACE_WINDOW, ReconcileOutcome, Reconciler, UpdateSource};
use crate::store::SettingsStore;
use crate::theme::{CURRENT_THEME_KEY, LOCAL_CACHE_KEY, ThemeValue};
use state::SharedState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Default interval between remote polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Tunables for a mounted context.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub poll_interval: Duration,
    pub grace_window: Duration,
    /// Key of the remote settings row
    pub settings_key: String,
    /// Key of the local cache slot, also used on the cross-tab bus
    pub cache_key: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            grace_window: DEFAULT_GRACE_WINDOW,
            settings_key: CURRENT_THEME_KEY.to_string(),
            cache_key: LOCAL_CACHE_KEY.to_string(),
        }
    }
}

impl SyncOptions {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_grace_window(mut self, grace_window: Duration) -> Self {
        self.grace_window = grace_window;
        self
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.poll_interval.is_zero() {
            return Err(SyncError::Configuration(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        if self.settings_key.is_empty() || self.cache_key.is_empty() {
            return Err(SyncError::Configuration(
                "Settings and cache keys must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Collaborators a context talks to.
#[derive(Clone)]
pub struct ThemeSyncDeps {
    pub store: Arc<dyn SettingsStore>,
    pub cache: Arc<dyn LocalCache>,
    pub cross_tab: CrossTabEndpoint,
    pub clock: Arc<dyn Clock>,
}

impl ThemeSyncDeps {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        cache: Arc<dyn LocalCache>,
        cross_tab: CrossTabEndpoint,
    ) -> Self {
        Self {
            store,
            cache,
            cross_tab,
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Outcome of a manual theme change.
///
/// `success` describes the local change. A remote persist failure leaves
/// `success` true and is carried in `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetThemeResult {
    pub success: bool,
    pub error: Option<SyncError>,
}

impl SetThemeResult {
    fn applied() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn applied_with_remote_error(error: SyncError) -> Self {
        Self {
            success: true,
            error: Some(error),
        }
    }

    fn rejected(error: SyncError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

pub struct ThemeContext {
    state: Arc<SharedState>,
    store: Arc<dyn SettingsStore>,
    cross_tab: CrossTabEndpoint,
    cache_key: String,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    subscription_id: Mutex<Option<Uuid>>,
}

impl ThemeContext {
    /// Bootstrap from the local cache and start all listeners.
    ///
    /// Must be called from within a tokio runtime. A store without a push
    /// channel is not an error: the context logs it and relies on polling.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] when `options` are invalid.
    pub async fn mount(deps: ThemeSyncDeps, options: SyncOptions) -> SyncResult<Self> {
        options.validate()?;

        let reconciler = Reconciler::bootstrap(deps.cache.clone(), &options.cache_key)
            .with_grace_window(options.grace_window);
        log::info!(
            "Mounting theme context {} with theme '{}'",
            deps.cross_tab.id(),
            reconciler.current()
        );

        let state = Arc::new(SharedState::new(
            reconciler,
            deps.clock.clone(),
            options.settings_key.clone(),
        ));
        let cancel = CancellationToken::new();

        // Listen before fetching so nothing written in between is missed
        let cross_tab_rx = deps.cross_tab.subscribe();
        let subscription = match deps.store.subscribe(&options.settings_key).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                log::warn!("Push updates unavailable, polling only: {e}");
                None
            }
        };
        let subscription_id = subscription.as_ref().map(|s| s.id);

        let mut tasks = vec![
            listeners::spawn_cross_tab_listener(
                state.clone(),
                cross_tab_rx,
                options.cache_key.clone(),
                cancel.clone(),
            ),
            listeners::spawn_initial_fetch(state.clone(), deps.store.clone(), cancel.clone()),
            listeners::spawn_poll_loop(
                state.clone(),
                deps.store.clone(),
                options.poll_interval,
                cancel.clone(),
            ),
        ];
        if let Some(subscription) = subscription {
            tasks.push(listeners::spawn_push_listener(
                state.clone(),
                subscription,
                cancel.clone(),
            ));
        }

        Ok(Self {
            state,
            store: deps.store,
            cross_tab: deps.cross_tab,
            cache_key: options.cache_key,
            cancel,
            tasks: Mutex::new(tasks),
            subscription_id: Mutex::new(subscription_id),
        })
    }

    pub fn id(&self) -> Uuid {
        self.cross_tab.id()
    }

    pub fn current_theme(&self) -> ThemeValue {
        self.state.current()
    }

    pub fn last_local_update(&self) -> Option<u64> {
        self.state.last_local_update()
    }

    /// Receiver that observes every applied theme change.
    pub fn subscribe(&self) -> watch::Receiver<ThemeValue> {
        self.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Manual, user-initiated theme change.
    ///
    /// The local state is updated before this future first yields, so callers
    /// observe the new theme immediately regardless of the remote outcome.
    pub async fn set_theme(&self, theme: ThemeValue) -> SetThemeResult {
        self.state.apply_manual(theme);
        self.cross_tab.broadcast(&self.cache_key, theme.slug());

        match self.store.upsert(self.state.settings_key(), theme.slug()).await {
            Ok(record) => {
                self.state.observe_version(record.version);
                log::debug!("Persisted theme '{theme}' as v{}", record.version);
                SetThemeResult::applied()
            }
            Err(e) => {
                log::warn!("Theme '{theme}' applied locally but not persisted: {e}");
                SetThemeResult::applied_with_remote_error(e)
            }
        }
    }

    /// Parse user input and set it. Unknown themes change nothing.
    pub async fn set_theme_str(&self, input: &str) -> SetThemeResult {
        match input.parse::<ThemeValue>() {
            Ok(theme) => self.set_theme(theme).await,
            Err(e) => {
                log::warn!("Rejected manual theme change: {e}");
                SetThemeResult::rejected(e)
            }
        }
    }

    /// Feed a candidate from a host-provided source, stamped with this
    /// context's clock.
    pub fn reconcile(&self, candidate: &str, source: UpdateSource) -> ReconcileOutcome {
        self.state.reconcile(candidate, source)
    }

    /// Force a remote read outside the poll schedule.
    pub async fn refresh(&self) -> Option<ReconcileOutcome> {
        self.state
            .fetch_and_reconcile(self.store.as_ref(), UpdateSource::PeriodicPoll)
            .await
    }

    /// Stop all listeners and release the push subscription.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                log::error!("Theme listener task failed: {e}");
            }
        }

        let subscription_id = match self.subscription_id.lock() {
            Ok(mut id) => id.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(id) = subscription_id {
            if let Err(e) = self.store.unsubscribe(id).await {
                log::warn!("Failed to release subscription {id}: {e}");
            }
        }

        log::info!("Theme context {} unmounted", self.id());
    }
}

impl Drop for ThemeContext {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ThemeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeContext")
            .field("id", &self.id())
            .field("current", &self.current_theme())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
