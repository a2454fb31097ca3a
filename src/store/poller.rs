//! Polling watcher for the device configuration file.
//!
//! # State Transitions
//! ```text
//! Stopped → Running: file found by a load, or a save succeeded
//! Running → Stopped: load reports the file missing or unreadable
//! ```
//!
//! While Stopped no reload attempts are made, so a permanently missing or
//! corrupt file does not cost a read every tick. The next successful save
//! brings polling back.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::store::config_store::{ConfigStore, LoadOutcome};
use crate::store::persist::StoreError;

/// Polling lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

impl PollerState {
    pub fn is_running(&self) -> bool {
        matches!(self, PollerState::Running)
    }

    /// State after a reload check finished with `result`.
    pub fn after_load(self, result: &Result<LoadOutcome, StoreError>) -> PollerState {
        match result {
            Ok(LoadOutcome::Reloaded | LoadOutcome::Unchanged) => PollerState::Running,
            Ok(LoadOutcome::NotFound) | Err(_) => PollerState::Stopped,
        }
    }

    /// State after the configuration was written successfully.
    pub fn after_save(self) -> PollerState {
        PollerState::Running
    }
}

/// Periodic reload task driving [`ConfigStore::load`].
pub struct Poller {
    store: Arc<ConfigStore>,
    interval: Duration,
}

impl Poller {
    pub fn new(store: Arc<ConfigStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Start the polling task. The task lives until the returned handle is
    /// stopped or dropped.
    pub fn spawn(self) -> PollerHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(stop_rx));
        PollerHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    async fn run(self, mut stop: oneshot::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            path = %self.store.path().display(),
            "Config poller starting"
        );

        let mut state = self.store.subscribe_polling();
        let mut ticker = time::interval(self.interval);
        // A tick that comes due while a load is still running is dropped.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let running = state.borrow_and_update().is_running();

            if running {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        // Outcome and errors are logged by the store.
                        let _ = self.store.load().await;
                    }
                    changed = state.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            } else {
                tokio::select! {
                    _ = &mut stop => break,
                    changed = state.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        ticker.reset();
                    }
                }
            }
        }

        tracing::info!("Config poller stopped");
    }
}

/// Owns the polling task.
///
/// [`PollerHandle::stop`] ends the task and waits for it; dropping the handle
/// without stopping aborts the task instead.
pub struct PollerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop the timer and wait for an in-flight load to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Config poller task failed");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
