//! Metrics collection and exposition.
//!
//! # Metrics
//! - `upload_requests_total` (counter): finished upload requests by outcome
//! - `upload_bytes_total` (counter): payload bytes written to storage
//! - `upload_duration_seconds` (histogram): time from headers to response
//! - `uploads_in_flight` (gauge): uploads currently streaming

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the end of an upload request.
pub fn record_upload(outcome: &'static str, bytes: u64, start: Instant) {
    counter!("upload_requests_total", "outcome" => outcome).increment(1);
    if bytes > 0 {
        counter!("upload_bytes_total").increment(bytes);
    }
    histogram!("upload_duration_seconds", "outcome" => outcome).record(start.elapsed().as_secs_f64());
}

/// Keeps `uploads_in_flight` accurate for the lifetime of one upload.
pub struct InFlightGuard;

impl InFlightGuard {
    pub fn new() -> Self {
        gauge!("uploads_in_flight").increment(1.0);
        Self
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("uploads_in_flight").decrement(1.0);
    }
}
