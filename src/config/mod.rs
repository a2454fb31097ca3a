//! Service settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional, MODE_CONTROL_SETTINGS)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (HOST, PORT, MODE_CONTROL_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServerSettings (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Settings are read once at startup; only the device configuration
//!   (see `store`) changes while running
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, load_settings, SettingsError};
pub use schema::{
    HttpSettings, ListenerSettings, LogFormat, ObservabilitySettings, ServerSettings,
    StorageSettings,
};
