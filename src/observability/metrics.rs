//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mad_requests_total` (counter): dispatched requests by method, status, controller
//! - `mad_request_duration_seconds` (histogram): dispatch latency by controller
//! - `mad_dispatch_errors_total` (counter): failed dispatches by error kind
//! - `mad_route_reloads_total` (counter): route table swaps

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, controller: &str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "mad_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "controller" => controller.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "mad_request_duration_seconds",
        "controller" => controller.to_string()
    )
    .record(elapsed);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("mad_dispatch_errors_total", "kind" => kind).increment(1);
}

pub fn record_reload() {
    metrics::counter!("mad_route_reloads_total").increment(1);
}
