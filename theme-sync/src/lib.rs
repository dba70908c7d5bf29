//! # Theme Sync Library
//!
//! Keeps a storefront's active theme consistent across every open context
//! ("tab") and one shared remote settings record.
//!
//! ## Modules
//!
//! - [`theme`] - The closed theme catalogue and the remote record type
//! - [`reconciler`] - Accept/ignore decisions for incoming theme candidates
//! - [`context`] - Mounted context wiring fetch, push, poll and cross-tab inputs
//! - [`store`] - Remote settings store trait with in-memory and REST backends
//! - [`cache`] - Local bootstrap cache trait with memory and file backends
//! - [`cross_tab`] - Broadcast bus between contexts in one process
//! - [`clock`] - Millisecond clocks used to stamp reconcile calls
//! - [`common`] - Error types shared across the crate

pub mod cache;
pub mod clock;
pub mod common;
pub mod context;
pub mod cross_tab;
pub mod reconciler;
pub mod store;
pub mod theme;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use common::{SyncError, SyncResult};
pub use context::{SetThemeResult, SyncOptions, ThemeContext, ThemeSyncDeps};
pub use cross_tab::{CrossTabChannel, CrossTabEndpoint};
pub use reconciler::{IgnoreReason, ReconcileOutcome, Reconciler, UpdateSource};
pub use store::{InMemorySettingsStore, RestSettingsStore, RestStoreConfig, SettingsStore};
pub use theme::{ThemeRecord, ThemeValue};
