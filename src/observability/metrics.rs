//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by outcome
//! - `gateway_request_duration_seconds` (histogram): handler latency
//! - `gateway_config_reloads_total` (counter): reload attempts by result
//! - `gateway_config_version` (gauge): version of the current routing snapshot
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until a
//!   recorder is installed, so tests and the offline tool pay nothing

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("gateway_requests_total", "Requests handled, by outcome");
    describe_histogram!("gateway_request_duration_seconds", "Time spent deciding a redirect");
    describe_counter!("gateway_config_reloads_total", "Routing reload attempts, by result");
    describe_gauge!("gateway_config_version", "Version of the active routing snapshot");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("gateway_requests_total", "outcome" => outcome).increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_reload(result: &'static str) {
    counter!("gateway_config_reloads_total", "result" => result).increment(1);
}

pub fn set_config_version(version: u64) {
    gauge!("gateway_config_version").set(version as f64);
}
