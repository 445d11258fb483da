//! Metrics collection and exposition.
//!
//! # Metrics
//! - `drain_admissions_total` (counter): admitted/rejected work by role
//! - `drain_transitions_total` (counter): Active → Draining transitions
//! - `drain_downstream_calls_total` (counter): outbound calls by outcome
//! - `drain_downstream_call_duration_seconds` (histogram): outbound latency
//! - `drain_inflight_requests` (gauge): admitted work not yet finished
//!
//! Recording is a no-op until a recorder is installed by `init_metrics`.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admission(role: &'static str, admitted: bool) {
    let outcome = if admitted { "admitted" } else { "rejected" };
    ::metrics::counter!("drain_admissions_total", "role" => role, "outcome" => outcome).increment(1);
}

pub fn record_drain_transition() {
    ::metrics::counter!("drain_transitions_total").increment(1);
}

pub fn record_downstream_call(outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!("drain_downstream_calls_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("drain_downstream_call_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

pub fn set_inflight(count: u64) {
    ::metrics::gauge!("drain_inflight_requests").set(count as f64);
}
