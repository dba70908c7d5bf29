//! Background tasks feeding candidates into a mounted context.
//!
//! Each task stops as soon as the context's cancellation token fires.

use super::state::SharedState;
use crate::cross_tab::CrossTabReceiver;
use crate::reconciler::UpdateSource;
use crate::store::{SettingsStore, Subscription};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

pub(crate) fn spawn_initial_fetch(
    state: Arc<SharedState>,
    store: Arc<dyn SettingsStore>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            outcome = state.fetch_and_reconcile(store.as_ref(), UpdateSource::InitialFetch) => {
                log::debug!("Initial theme fetch finished: {outcome:?}");
            }
        }
    })
}

pub(crate) fn spawn_push_listener(
    state: Arc<SharedState>,
    mut subscription: Subscription,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::debug!("Push listener started for '{}'", subscription.key);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                change = subscription.changes.recv() => match change {
                    Some(record) => {
                        state.reconcile_record(&record, UpdateSource::PushNotification);
                    }
                    None => {
                        log::warn!("Push channel closed, continuing on polling alone");
                        break;
                    }
                },
            }
        }
        log::debug!("Push listener stopped");
    })
}

pub(crate) fn spawn_poll_loop(
    state: Arc<SharedState>,
    store: Arc<dyn SettingsStore>,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip the first immediate tick, the initial fetch covers it

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    state
                        .fetch_and_reconcile(store.as_ref(), UpdateSource::PeriodicPoll)
                        .await;
                }
            }
        }
        log::debug!("Poll loop stopped");
    })
}

pub(crate) fn spawn_cross_tab_listener(
    state: Arc<SharedState>,
    mut receiver: CrossTabReceiver,
    cache_key: String,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                message = receiver.recv() => match message {
                    Some(message) if message.key == cache_key => {
                        state.reconcile(&message.value, UpdateSource::CrossTabBroadcast);
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }
        log::debug!("Cross-tab listener stopped");
    })
}
