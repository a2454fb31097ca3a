//! Startup orchestration.
//!
//! Order: load the device configuration (defaults if absent), bind the
//! listener, start the poller, then start serving. Traffic is only accepted
//! once the store holds its initial configuration.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ServerSettings;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::store::{ConfigStore, LoadOutcome, Poller, PollerHandle};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Build the store and run the initial load.
///
/// A missing or unreadable file is not fatal: the store keeps its defaults
/// and polling stays stopped until the first successful save.
pub async fn initialize_store(settings: &ServerSettings) -> Arc<ConfigStore> {
    let store = Arc::new(ConfigStore::new(
        settings.config_file_path(),
        settings.storage.allowed_modes.clone(),
    ));

    match store.load().await {
        Ok(LoadOutcome::Reloaded | LoadOutcome::Unchanged) => {
            tracing::info!(path = %store.path().display(), "Initial configuration loaded");
        }
        Ok(LoadOutcome::NotFound) => {
            tracing::warn!(
                path = %store.path().display(),
                "Configuration file not found, using defaults until the first update"
            );
        }
        Err(_) => {
            tracing::warn!(
                path = %store.path().display(),
                "Configuration file unreadable, using defaults until the first update"
            );
        }
    }

    store
}

/// A started service: HTTP server task plus config poller.
pub struct RunningService {
    local_addr: SocketAddr,
    store: Arc<ConfigStore>,
    server: JoinHandle<io::Result<()>>,
    poller: PollerHandle,
}

impl RunningService {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Wait for the server to drain after shutdown, then stop the poller.
    pub async fn wait(self) -> io::Result<()> {
        let result = match self.server.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(e)),
        };
        self.poller.stop().await;
        result
    }
}

/// Start every subsystem. The service runs until `shutdown` is triggered.
pub async fn launch(
    settings: &ServerSettings,
    shutdown: &Shutdown,
) -> Result<RunningService, StartupError> {
    let store = initialize_store(settings).await;

    let address = settings.bind_address();
    let bind_err = |source: io::Error| StartupError::Bind {
        address: address.clone(),
        source,
    };
    let listener = TcpListener::bind(&address).await.map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let poller = Poller::new(Arc::clone(&store), settings.poll_interval()).spawn();

    let server = HttpServer::new(&settings.http, AppState::new(Arc::clone(&store)));
    let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Ok(RunningService {
        local_addr,
        store,
        server,
        poller,
    })
}
