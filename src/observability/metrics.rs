//! Metrics collection and exposition.
//!
//! # Metrics
//! - `route_dispatch_total` (counter): dispatches by outcome
//! - `route_cache_events_total` (counter): hit, miss, stale, invalid, stored, store_failed
//! - `route_requests_total` (counter): front controller responses by method, status
//! - `route_request_duration_seconds` (histogram): front controller latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(outcome: &'static str) {
    ::metrics::counter!("route_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_event(event: &'static str) {
    ::metrics::counter!("route_cache_events_total", "event" => event).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    ::metrics::counter!("route_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    ::metrics::histogram!("route_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}
