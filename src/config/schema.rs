//! Service settings schema.
//!
//! All types derive Serde traits for deserialization from the TOML settings
//! file; every section has defaults so an empty file is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::Mode;

/// Location of the device configuration file under the installation directory.
pub const DEVICE_CONFIG_RELATIVE_PATH: &str = "config/device_config.json";

/// Root settings for the service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address.
    pub listener: ListenerSettings,

    /// Device configuration file and polling.
    pub storage: StorageSettings,

    /// HTTP layer behavior.
    pub http: HttpSettings,

    /// Logging and metrics.
    pub observability: ObservabilitySettings,
}

impl ServerSettings {
    /// `host:port` to bind the API listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }

    /// Path of the device configuration file.
    pub fn config_file_path(&self) -> PathBuf {
        self.storage.install_dir.join(DEVICE_CONFIG_RELATIVE_PATH)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.storage.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Installation directory; the device config lives below it.
    pub install_dir: PathBuf,

    /// Reload check period in milliseconds.
    pub poll_interval_ms: u64,

    /// Modes the API accepts. Order is kept in error messages.
    pub allowed_modes: Vec<Mode>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from("."),
            poll_interval_ms: 100,
            allowed_modes: Mode::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Allow requests from any origin.
    pub cors_enabled: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            cors_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
