//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record one forward latency observation per attempt, per mapping
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `<prefix>.<mapping>` (histogram, seconds): upstream call latency, recorded on
//!   success, upstream-status outcomes and transport failures alike
//!
//! # Design Decisions
//! - The forwarder sees an optional `MetricsSink`; no sink means nothing is recorded
//! - `PrometheusSink` goes through the `metrics` facade so any recorder works

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Destination of forward latency observations.
pub trait MetricsSink: Send + Sync {
    fn record_latency(&self, metric_name: &str, elapsed: Duration);
}

/// Records into the globally installed `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn record_latency(&self, metric_name: &str, elapsed: Duration) {
        metrics::histogram!(metric_name.to_owned()).record(elapsed.as_secs_f64());
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}
