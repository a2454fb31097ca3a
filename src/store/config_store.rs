//! The configuration store.
//!
//! Single source of truth for the device configuration. Owns the in-memory
//! snapshot, the file modification watermark and the polling switch.
//!
//! # Concurrency
//! - Writers (`apply`, `save`, `load`) serialize on one async mutex that
//!   guards the watermark; last entry wins
//! - Readers (`get`, `snapshot`) load an `Arc` from an [`ArcSwap`] and never
//!   wait on writers, so a slow disk only delays other writers
//! - Poller state transitions happen inside the writer section, so a reload
//!   that saw a missing file cannot stop polling after a concurrent save
//!   recreated it

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwap;
use tokio::sync::{watch, Mutex};

use crate::observability::metrics;
use crate::store::model::{now_millis, ConfigProjection, DeviceConfig, Mode, ModeSettings};
use crate::store::persist::{self, StoreError};
use crate::store::poller::PollerState;

/// Result of a reload check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file does not exist.
    NotFound,
    /// The file's modification time matches the watermark.
    Unchanged,
    /// The file changed and replaced the in-memory configuration.
    Reloaded,
}

impl LoadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOutcome::NotFound => "not_found",
            LoadOutcome::Unchanged => "unchanged",
            LoadOutcome::Reloaded => "reloaded",
        }
    }
}

pub struct ConfigStore {
    path: PathBuf,
    allowed: Vec<Mode>,
    snapshot: ArcSwap<DeviceConfig>,
    /// Last observed modification time; the lock doubles as the writer section.
    watermark: Mutex<Option<SystemTime>>,
    polling: watch::Sender<PollerState>,
    loaded: AtomicBool,
}

impl ConfigStore {
    /// Create a store holding the default configuration, polling stopped.
    pub fn new(path: impl Into<PathBuf>, allowed: Vec<Mode>) -> Self {
        let (polling, _) = watch::channel(PollerState::Stopped);
        Self {
            path: path.into(),
            allowed,
            snapshot: ArcSwap::from_pointee(DeviceConfig::default()),
            watermark: Mutex::new(None),
            polling,
            loaded: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn allowed_modes(&self) -> &[Mode] {
        &self.allowed
    }

    /// Latest committed configuration.
    pub fn snapshot(&self) -> Arc<DeviceConfig> {
        self.snapshot.load_full()
    }

    /// Whether the configuration has been read from or written to the file.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn polling_state(&self) -> PollerState {
        *self.polling.borrow()
    }

    pub fn is_polling(&self) -> bool {
        self.polling_state().is_running()
    }

    /// Receiver that observes polling transitions.
    pub fn subscribe_polling(&self) -> watch::Receiver<PollerState> {
        self.polling.subscribe()
    }

    /// Check the file for changes and reload it if needed.
    ///
    /// A missing or unreadable file stops polling; a readable one starts it.
    /// On error the in-memory configuration is left as it was.
    pub async fn load(&self) -> Result<LoadOutcome, StoreError> {
        let mut watermark = self.watermark.lock().await;
        let result = self.load_locked(&mut watermark).await;

        match &result {
            Ok(LoadOutcome::Reloaded) => {
                let config = self.snapshot.load();
                tracing::info!(
                    path = %self.path.display(),
                    mode = %config.mode,
                    "Configuration reloaded from file"
                );
            }
            Ok(LoadOutcome::Unchanged) => {
                tracing::trace!(path = %self.path.display(), "Configuration file unchanged");
            }
            Ok(LoadOutcome::NotFound) => {
                if self.is_polling() {
                    tracing::warn!(path = %self.path.display(), "Configuration file not found");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload configuration, keeping current one");
            }
        }
        metrics::record_reload(match &result {
            Ok(outcome) => outcome.as_str(),
            Err(_) => "error",
        });

        self.transition(self.polling_state().after_load(&result));
        result
    }

    async fn load_locked(
        &self,
        watermark: &mut Option<SystemTime>,
    ) -> Result<LoadOutcome, StoreError> {
        let Some(modified) = persist::modified_time(&self.path).await? else {
            return Ok(LoadOutcome::NotFound);
        };
        if *watermark == Some(modified) {
            return Ok(LoadOutcome::Unchanged);
        }

        let persisted = persist::read_config(&self.path).await?;
        if !persisted.extra.is_empty() {
            tracing::debug!(
                fields = ?persisted.extra.keys().collect::<Vec<_>>(),
                "Ignoring unknown configuration fields"
            );
        }

        let config = DeviceConfig::from_persisted(persisted, now_millis());
        self.snapshot.store(Arc::new(config));
        *watermark = Some(modified);
        self.loaded.store(true, Ordering::Release);
        Ok(LoadOutcome::Reloaded)
    }

    /// Persist the current configuration and make sure polling is running.
    pub async fn save(&self) -> Result<(), StoreError> {
        let mut watermark = self.watermark.lock().await;
        self.save_locked(&mut watermark).await
    }

    async fn save_locked(&self, watermark: &mut Option<SystemTime>) -> Result<(), StoreError> {
        let config = self.snapshot.load_full();
        match persist::write_config(&self.path, &config.to_persisted()).await {
            Ok(modified) => {
                *watermark = Some(modified);
                self.loaded.store(true, Ordering::Release);
                metrics::record_save("ok");
                tracing::debug!(path = %self.path.display(), "Configuration saved");
                self.transition(self.polling_state().after_save());
                Ok(())
            }
            Err(e) => {
                metrics::record_save("error");
                tracing::error!(error = %e, "Failed to save configuration");
                Err(e)
            }
        }
    }

    /// Current configuration projected onto its active mode.
    pub fn get(&self) -> Result<ConfigProjection, StoreError> {
        let config = self.snapshot.load();
        config
            .project(&self.allowed)
            .map_err(|_| StoreError::InvalidMode(config.mode.clone()))
    }

    /// Switch to a validated mode, update that mode's fields and persist.
    ///
    /// If the save fails the in-memory change stays in place until the next
    /// successful save or reload.
    pub async fn apply(&self, settings: ModeSettings) -> Result<ConfigProjection, StoreError> {
        let mut watermark = self.watermark.lock().await;

        let current = self.snapshot.load_full();
        let mut next = DeviceConfig::clone(&current);
        next.apply(&settings, current.next_timestamp());
        let next = Arc::new(next);
        self.snapshot.store(Arc::clone(&next));

        self.save_locked(&mut watermark).await?;

        next.project(&self.allowed)
            .map_err(|_| StoreError::InvalidMode(next.mode.clone()))
    }

    fn transition(&self, next: PollerState) {
        let changed = self.polling.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            tracing::info!(state = ?next, "Config polling state changed");
            metrics::set_polling_active(next.is_running());
        }
    }
}
