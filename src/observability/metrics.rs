//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pengoe_requests_total` (counter): requests by method, status, route
//! - `pengoe_request_duration_seconds` (histogram): latency distribution
//! - `pengoe_csrf_tokens_total` (counter): token store events
//! - `pengoe_csrf_store_size` (gauge): live token records
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until
//!   `init_metrics` installs the Prometheus recorder
//! - Route labels use the registered pattern, never the raw path

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "pengoe_requests_total";
pub const REQUEST_DURATION: &str = "pengoe_request_duration_seconds";
pub const CSRF_TOKENS_TOTAL: &str = "pengoe_csrf_tokens_total";
pub const CSRF_STORE_SIZE: &str = "pengoe_csrf_store_size";

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    ::metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    ::metrics::histogram!(REQUEST_DURATION, "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Count a token store event (`create`, `renew`, `delete`, `invalid`, `contention`).
pub fn record_token_event(event: &'static str) {
    ::metrics::counter!(CSRF_TOKENS_TOTAL, "event" => event).increment(1);
}

pub fn record_store_size(size: usize) {
    ::metrics::gauge!(CSRF_STORE_SIZE).set(size as f64);
}
