//! Prometheus metrics for the gateway.
//!
//! Tracks upstream Myriad traffic (latency, retries, failures) and the
//! volume of bot state flowing through the ingestion endpoints.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

/// Myriad request latency metric name.
pub const METRIC_MYRIAD_LATENCY: &str = "myriad_request_latency_ms";
/// Myriad requests counter metric name.
pub const METRIC_MYRIAD_REQUESTS: &str = "myriad_requests_total";
/// Myriad retries counter metric name.
pub const METRIC_MYRIAD_RETRIES: &str = "myriad_retries_total";
/// Myriad failed requests counter metric name.
pub const METRIC_MYRIAD_FAILURES: &str = "myriad_request_failures_total";
/// Bot state updates counter metric name.
pub const METRIC_STATE_UPDATES: &str = "state_updates_total";
/// Recorded decisions counter metric name.
pub const METRIC_DECISIONS_RECORDED: &str = "decisions_recorded_total";
/// Recorded trades counter metric name.
pub const METRIC_TRADES_RECORDED: &str = "trades_recorded_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_MYRIAD_LATENCY,
        "Myriad API request latency in milliseconds"
    );

    describe_counter!(
        METRIC_MYRIAD_REQUESTS,
        "Total number of Myriad API requests by endpoint and status"
    );
    describe_counter!(
        METRIC_MYRIAD_RETRIES,
        "Total number of retried Myriad API requests"
    );
    describe_counter!(
        METRIC_MYRIAD_FAILURES,
        "Total number of Myriad API requests that ultimately failed"
    );
    describe_counter!(
        METRIC_STATE_UPDATES,
        "Total number of bot state updates ingested"
    );
    describe_counter!(
        METRIC_DECISIONS_RECORDED,
        "Total number of trade decisions recorded"
    );
    describe_counter!(
        METRIC_TRADES_RECORDED,
        "Total number of completed trades recorded"
    );

    debug!("Metrics initialized");
}

/// Record Myriad request latency for one attempt.
pub fn record_myriad_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_MYRIAD_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment the Myriad requests counter.
pub fn inc_myriad_requests(endpoint: &str, status: u16) {
    counter!(
        METRIC_MYRIAD_REQUESTS,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment the Myriad retries counter.
pub fn inc_myriad_retries(endpoint: &str) {
    counter!(METRIC_MYRIAD_RETRIES, "endpoint" => endpoint.to_string()).increment(1);
}

/// Increment the Myriad failures counter.
pub fn inc_myriad_failures(endpoint: &str) {
    counter!(METRIC_MYRIAD_FAILURES, "endpoint" => endpoint.to_string()).increment(1);
}

/// Increment the state updates counter.
pub fn inc_state_updates() {
    counter!(METRIC_STATE_UPDATES).increment(1);
}

/// Increment the decisions recorded counter.
pub fn inc_decisions_recorded() {
    counter!(METRIC_DECISIONS_RECORDED).increment(1);
}

/// Increment the trades recorded counter.
pub fn inc_trades_recorded() {
    counter!(METRIC_TRADES_RECORDED).increment(1);
}
