//! Metrics collection and exposition.
//!
//! # Metrics
//! - `environment_resolutions_total` (counter): resolutions by winning rule
//!   (`host`, `header`, `path`, or `default`)
//! - `environment_resolution_errors_total` (counter): failed resolutions by route
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exposition on its own listener

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::environment::RuleKind;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_resolution(matched_by: Option<RuleKind>) {
    let rule = matched_by.map(|kind| kind.as_str()).unwrap_or("default");
    ::metrics::counter!("environment_resolutions_total", "rule" => rule).increment(1);
}

pub fn record_resolution_error(route: &str) {
    ::metrics::counter!("environment_resolution_errors_total", "route" => route.to_string())
        .increment(1);
}
