//! Metrics collection and exposition.
//!
//! # Metrics
//! - `secure_gate_requests_total` (counter): requests by outcome
//!   (`passed`, `redirected`, `rejected`)
//! - `secure_gate_redirects_total` (counter): HTTPS redirects by kind
//!   (`permanent`, `temporary`)
//! - `secure_gate_rejected_hosts_total` (counter): disallowed hosts

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_passed() {
    metrics::counter!("secure_gate_requests_total", "outcome" => "passed").increment(1);
}

pub fn record_redirect(permanent: bool) {
    let kind = if permanent { "permanent" } else { "temporary" };
    metrics::counter!("secure_gate_requests_total", "outcome" => "redirected").increment(1);
    metrics::counter!("secure_gate_redirects_total", "kind" => kind).increment(1);
}

pub fn record_rejected_host() {
    metrics::counter!("secure_gate_requests_total", "outcome" => "rejected").increment(1);
    metrics::counter!("secure_gate_rejected_hosts_total").increment(1);
}
