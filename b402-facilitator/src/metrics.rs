//! Prometheus metrics for the facilitator service.
//!
//! Metric names are part of the operational contract (dashboards and alerts
//! key on them) and must stay stable.

use prometheus::{
    Encoder, Histogram, HistogramVec, IntCounterVec, IntGauge, TextEncoder, register_histogram,
    register_histogram_vec, register_int_counter_vec, register_int_gauge,
};
use std::sync::LazyLock;

/// Verify request outcomes, labeled `invalid` / `failed` / `success` / `error`.
pub static VERIFY_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "b402_verify_requests_total",
        "Total number of verify requests",
        &["status"]
    )
    .unwrap()
});

/// Settle request outcomes, labeled `invalid` / `failed` / `success`.
pub static SETTLE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "b402_settle_requests_total",
        "Total number of settle requests",
        &["status"]
    )
    .unwrap()
});

/// Gas used by the most recent settle transaction.
pub static SETTLE_GAS_USED: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!("b402_settle_gas_used", "Gas used in settle transactions").unwrap()
});

/// Wall-clock time from submission to first confirmation.
pub static SETTLE_TRANSACTION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "b402_settle_transaction_seconds",
        "Time taken for settle transactions",
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap()
});

/// End-to-end HTTP request latency per route and status.
pub static HTTP_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "http_request_duration_seconds",
        "Duration of HTTP requests in seconds",
        &["method", "route", "status"]
    )
    .unwrap()
});

/// Encodes the default registry in Prometheus text exposition format.
#[must_use]
pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
