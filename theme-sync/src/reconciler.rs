//! Decision logic for incoming theme candidates.
//!
//! A [`Reconciler`] owns the displayed theme and the timestamp of the last
//! local change. Every candidate, whatever channel it arrived on, goes through
//! [`Reconciler::reconcile`] and ends as either [`ReconcileOutcome::Applied`]
//! or [`ReconcileOutcome::Ignored`].
//!
//! ## Rules
//!
//! - [`UpdateSource::CrossTabBroadcast`] is always applied and restarts the
//!   grace window, since another context only broadcasts after a user action.
//! - [`UpdateSource::InitialFetch`], [`UpdateSource::PushNotification`] and
//!   [`UpdateSource::PeriodicPoll`] are applied only when the value differs
//!   from the current one and the grace window since the last local change has
//!   elapsed. They never move the timestamp.
//! - Candidates outside the catalogue are dropped with a log line.

use crate::cache::LocalCache;
use crate::clock::duration_millis;
use crate::theme::{LOCAL_CACHE_KEY, ThemeRecord, ThemeValue};
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

/// Default suppression period after a local change.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_millis(5000);

/// Channel a candidate theme arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateSource {
    CrossTabBroadcast,
    InitialFetch,
    PushNotification,
    PeriodicPoll,
}

impl Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateSource::CrossTabBroadcast => "cross-tab broadcast",
            UpdateSource::InitialFetch => "initial fetch",
            UpdateSource::PushNotification => "push notification",
            UpdateSource::PeriodicPoll => "periodic poll",
        };
        f.write_str(name)
    }
}

/// Why a candidate did not replace the current theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not a member of the theme catalogue
    InvalidValue(String),
    /// Same as the theme already shown
    Unchanged,
    /// A local change happened less than the grace window ago
    WithinGraceWindow { elapsed_ms: u64 },
    /// Record version older than one already observed
    StaleVersion { version: u64, latest: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied(ThemeValue),
    Ignored(IgnoreReason),
}

impl ReconcileOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ReconcileOutcome::Applied(_))
    }
}

/// Owned reconciliation state for one context.
pub struct Reconciler {
    current: ThemeValue,
    last_local_update: Option<u64>,
    latest_version: Option<u64>,
    grace_window: Duration,
    cache: Arc<dyn LocalCache>,
    cache_key: String,
}

impl Reconciler {
    pub fn new(initial: ThemeValue, cache: Arc<dyn LocalCache>) -> Self {
        Self {
            current: initial,
            last_local_update: None,
            latest_version: None,
            grace_window: DEFAULT_GRACE_WINDOW,
            cache,
            cache_key: LOCAL_CACHE_KEY.to_string(),
        }
    }

    pub fn with_grace_window(mut self, grace_window: Duration) -> Self {
        self.grace_window = grace_window;
        self
    }

    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = cache_key.into();
        self
    }

    /// Build a reconciler seeded from the local cache, falling back to the
    /// default theme when the slot is empty or holds an unknown value.
    pub fn bootstrap(cache: Arc<dyn LocalCache>, cache_key: &str) -> Self {
        let initial = match cache.get(cache_key) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("Discarding cached theme: {e}");
                ThemeValue::default()
            }),
            None => ThemeValue::default(),
        };
        log::debug!("Bootstrapped theme '{initial}' from local cache");
        Self::new(initial, cache).with_cache_key(cache_key)
    }

    pub fn current(&self) -> ThemeValue {
        self.current
    }

    pub fn last_local_update(&self) -> Option<u64> {
        self.last_local_update
    }

    pub fn latest_version(&self) -> Option<u64> {
        self.latest_version
    }

    pub fn grace_window(&self) -> Duration {
        self.grace_window
    }

    /// Decide whether `candidate` replaces the current theme.
    pub fn reconcile(&mut self, candidate: &str, source: UpdateSource, now: u64) -> ReconcileOutcome {
        let theme = match candidate.parse::<ThemeValue>() {
            Ok(theme) => theme,
            Err(e) => {
                log::warn!("Ignoring {source} candidate: {e}");
                return ReconcileOutcome::Ignored(IgnoreReason::InvalidValue(candidate.to_string()));
            }
        };

        if source == UpdateSource::CrossTabBroadcast {
            self.last_local_update = Some(now);
            self.apply(theme, source);
            return ReconcileOutcome::Applied(theme);
        }

        if theme == self.current {
            log::trace!("Ignoring {source} candidate '{theme}': unchanged");
            return ReconcileOutcome::Ignored(IgnoreReason::Unchanged);
        }

        if let Some(last) = self.last_local_update {
            let elapsed_ms = now.saturating_sub(last);
            if elapsed_ms < duration_millis(self.grace_window) {
                log::debug!(
                    "Ignoring {source} candidate '{theme}': {elapsed_ms}ms since local change"
                );
                return ReconcileOutcome::Ignored(IgnoreReason::WithinGraceWindow { elapsed_ms });
            }
        }

        self.apply(theme, source);
        ReconcileOutcome::Applied(theme)
    }

    /// Reconcile a full remote record, dropping versions older than the
    /// newest one already seen.
    pub fn reconcile_record(
        &mut self,
        record: &ThemeRecord,
        source: UpdateSource,
        now: u64,
    ) -> ReconcileOutcome {
        if let Some(latest) = self.latest_version {
            if record.version < latest {
                log::debug!(
                    "Ignoring {source} record v{} ('{}'): already at v{latest}",
                    record.version,
                    record.value
                );
                return ReconcileOutcome::Ignored(IgnoreReason::StaleVersion {
                    version: record.version,
                    latest,
                });
            }
        }
        self.observe_version(record.version);
        self.reconcile(&record.value, source, now)
    }

    /// Record a version known to be current, e.g. the result of our own upsert.
    pub fn observe_version(&mut self, version: u64) {
        self.latest_version = Some(self.latest_version.map_or(version, |v| v.max(version)));
    }

    /// User-initiated change: applied unconditionally and restarts the grace
    /// window.
    pub fn apply_manual(&mut self, theme: ThemeValue, now: u64) {
        self.last_local_update = Some(now);
        if theme != self.current {
            log::info!("Theme set locally to '{theme}'");
        }
        self.current = theme;
        self.write_cache(theme);
    }

    fn apply(&mut self, theme: ThemeValue, source: UpdateSource) {
        if theme != self.current {
            log::info!("Theme changed '{}' -> '{theme}' via {source}", self.current);
        }
        self.current = theme;
        self.write_cache(theme);
    }

    fn write_cache(&self, theme: ThemeValue) {
        if let Err(e) = self.cache.set(&self.cache_key, theme.slug()) {
            log::warn!("Failed to persist theme '{theme}' locally: {e}");
        }
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("current", &self.current)
            .field("last_local_update", &self.last_local_update)
            .field("latest_version", &self.latest_version)
            .field("grace_window", &self.grace_window)
            .field("cache_key", &self.cache_key)
            .finish()
    }
}
