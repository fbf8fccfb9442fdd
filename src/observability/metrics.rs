//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relay requests by status
//! - `relay_request_duration_seconds` (histogram): end-to-end handler latency
//! - `relay_stage_duration_seconds` (histogram): per stage (upstream, persist) and outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter is opt-in via `observability.metrics_enabled`

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("relay_requests_total", "status" => status.clone()).increment(1);
    metrics::histogram!("relay_request_duration_seconds", "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_stage(stage: &'static str, outcome: &'static str, start: Instant) {
    metrics::histogram!(
        "relay_stage_duration_seconds",
        "stage" => stage,
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}
