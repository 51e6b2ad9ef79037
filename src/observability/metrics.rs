//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): gateway requests by method, status
//! - `gateway_request_duration_seconds` (histogram): gateway latency
//! - `rpc_recovered_panics_total` (counter): handler panics turned into errors

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Failures are logged, not fatal.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics exporter"),
    }
}

/// Record one translated gateway request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record a handler panic that was converted into an error response.
pub fn record_recovered_panic() {
    counter!("rpc_recovered_panics_total").increment(1);
}
