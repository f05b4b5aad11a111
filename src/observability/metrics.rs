//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forward_rules_apply_total` (counter): apply runs by outcome
//! - `forward_rules_skipped_total` (counter): rule entries skipped by reason
//! - `forward_rules_installed_rules` (gauge): size of the installed set
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is only installed by the daemon

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_apply(outcome: &'static str) {
    counter!("forward_rules_apply_total", "outcome" => outcome).increment(1);
}

pub fn record_skipped(reason: &'static str) {
    counter!("forward_rules_skipped_total", "reason" => reason).increment(1);
}

pub fn record_installed(count: usize) {
    gauge!("forward_rules_installed_rules").set(count as f64);
}
