//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;

use mode_control::config::{HttpSettings, ServerSettings};
use mode_control::http::{build_router, AppState};
use mode_control::lifecycle::{self, RunningService, Shutdown};
use mode_control::store::{ConfigStore, Mode};

/// Settings pointing at a scratch installation directory, ephemeral port,
/// and a short poll interval.
pub fn test_settings(install_dir: &Path) -> ServerSettings {
    let mut settings = ServerSettings::default();
    settings.listener.host = "127.0.0.1".into();
    settings.listener.port = 0;
    settings.storage.install_dir = install_dir.to_path_buf();
    settings.storage.poll_interval_ms = 20;
    settings
}

pub fn config_path(install_dir: &Path) -> PathBuf {
    test_settings(install_dir).config_file_path()
}

/// Router over a fresh store, for `oneshot` tests. No poller runs.
pub fn test_router() -> (axum::Router, Arc<ConfigStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(
        config_path(dir.path()),
        Mode::ALL.to_vec(),
    ));
    let router = build_router(&HttpSettings::default(), AppState::new(Arc::clone(&store)));
    (router, store, dir)
}

/// Start the whole service on an ephemeral port.
pub async fn start_service(install_dir: &Path) -> (RunningService, Shutdown, String) {
    let shutdown = Shutdown::new();
    let service = lifecycle::launch(&test_settings(install_dir), &shutdown)
        .await
        .unwrap();
    let base_url = format!("http://{}", service.local_addr());
    (service, shutdown, base_url)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Write `content` as if another process did, with a modification time that
/// cannot collide with the watermark of an earlier write.
pub fn write_externally(path: &Path, content: &str, age_offset: Duration) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + age_offset).unwrap();
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
