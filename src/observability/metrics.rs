//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mode_control_requests_total` (counter): API requests by method, path, status
//! - `mode_control_reloads_total` (counter): reload checks by outcome
//! - `mode_control_saves_total` (counter): file writes by result
//! - `mode_control_polling_active` (gauge): 1=polling, 0=stopped
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, path: &str, status: u16) {
    metrics::counter!(
        "mode_control_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_reload(outcome: &'static str) {
    metrics::counter!("mode_control_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_save(result: &'static str) {
    metrics::counter!("mode_control_saves_total", "result" => result).increment(1);
}

pub fn set_polling_active(active: bool) {
    metrics::gauge!("mode_control_polling_active").set(if active { 1.0 } else { 0.0 });
}
