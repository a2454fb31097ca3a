//! Device mode control service.
//!
//! Serves a small HTTP API for reading and changing the device's operating
//! mode while keeping an in-memory mirror of the configuration file that the
//! device driver reads.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                 MODE CONTROL                 │
//!                       │                                              │
//!     Client Request    │  ┌─────────┐    ┌───────────┐    ┌────────┐  │
//!     ──────────────────┼─▶│  http   │───▶│ validator │───▶│ config │  │
//!                       │  │ server  │    └───────────┘    │ store  │  │
//!     Client Response   │  │         │◀────────────────────│        │  │
//!     ◀─────────────────┼──│         │                     └───┬────┘  │
//!                       │  └─────────┘                         │ ▲     │
//!                       │                          save/reload │ │tick │
//!                       │                                      ▼ │     │
//!                       │                 ┌──────────────┐  ┌──────┐   │
//!     Device driver ◀───┼──── reads ──────│ config file  │  │poller│   │
//!                       │                 └──────────────┘  └──────┘   │
//!                       └──────────────────────────────────────────────┘
//! ```

use mode_control::config;
use mode_control::lifecycle::{self, signals, Shutdown};
use mode_control::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = config::load_from_env()?;

    observability::logging::init(&settings.observability);

    tracing::info!("mode-control v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %settings.bind_address(),
        config_file = %settings.config_file_path().display(),
        poll_interval_ms = settings.storage.poll_interval_ms,
        allowed_modes = ?settings.storage.allowed_modes,
        "Settings loaded"
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let service = lifecycle::launch(&settings, &shutdown).await?;
    service.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
