//! Metrics collection.
//!
//! # Metrics
//! - `devserve_proxy_requests_total` (counter): proxied requests by status
//! - `devserve_proxy_request_duration_seconds` (histogram): upstream latency
//!
//! No exporter is installed; an embedding pipeline may install a recorder.

use std::time::Instant;

/// Record one proxied request.
pub fn record_proxy_request(status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("devserve_proxy_requests_total", "status" => status.clone()).increment(1);
    metrics::histogram!("devserve_proxy_request_duration_seconds", "status" => status)
        .record(start.elapsed().as_secs_f64());
}
