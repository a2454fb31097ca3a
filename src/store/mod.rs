//! Device configuration synchronization.
//!
//! # Data Flow
//! ```text
//! POST /api/config
//!     → validation.rs (candidate → ModeSettings, or a reason)
//!     → config_store.rs apply (mutate snapshot, persist.rs write)
//!     → polling switched to Running
//!
//! Every poll tick (poller.rs):
//!     → config_store.rs load
//!     → persist.rs modification time vs watermark
//!     → changed: read + full overwrite of the snapshot
//!     → missing/unreadable: polling switched to Stopped
//! ```
//!
//! # Design Decisions
//! - The file is authoritative once changed externally: reloads replace
//!   every field, and are trusted rather than re-validated
//! - API writes only touch the selected mode's fields, so switching modes
//!   keeps settings the user may switch back to
//! - Change detection sits behind `ConfigStore::load`, so an event-driven
//!   watcher could replace the poller without touching callers

pub mod config_store;
pub mod model;
pub mod persist;
pub mod poller;
pub mod validation;

pub use config_store::{ConfigStore, LoadOutcome};
pub use model::{ConfigProjection, DeviceConfig, Mode, ModeSettings};
pub use persist::StoreError;
pub use poller::{Poller, PollerHandle, PollerState};
pub use validation::{ValidationError, Validator};
