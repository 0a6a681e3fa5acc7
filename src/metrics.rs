//! Prometheus metrics
//!
//! Cache effectiveness, storage health and upstream behavior, exposed on
//! `/metrics` in the Prometheus text format.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};

lazy_static! {
    /// Counter: cache lookups and writes by operation and result (hit/miss/stored)
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec!(
        "gifview_cache_operations_total",
        "Cache operations by operation tag and result",
        &["operation", "result"]
    )
    .expect("Failed to create cache_operations metric");

    /// Counter: storage failures that were degraded to a miss or no-op
    pub static ref CACHE_STORAGE_ERRORS: CounterVec = register_counter_vec!(
        "gifview_cache_storage_errors_total",
        "Cache storage failures by store operation",
        &["op"]
    )
    .expect("Failed to create cache_storage_errors metric");

    /// Counter: entries removed by sweeps
    pub static ref CACHE_SWEPT: Counter = register_counter!(
        "gifview_cache_swept_entries_total",
        "Expired cache entries removed by sweeps"
    )
    .expect("Failed to create cache_swept metric");

    /// Counter: upstream provider calls by operation and outcome
    pub static ref UPSTREAM_REQUESTS: CounterVec = register_counter_vec!(
        "gifview_upstream_requests_total",
        "Content provider calls by operation tag and outcome",
        &["operation", "outcome"]
    )
    .expect("Failed to create upstream_requests metric");

    /// Histogram: upstream provider latency (seconds)
    pub static ref UPSTREAM_DURATION: HistogramVec = register_histogram_vec!(
        "gifview_upstream_duration_seconds",
        "Duration of content provider calls",
        &["operation"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create upstream_duration metric");

    /// Counter: media proxy requests by outcome
    pub static ref PROXY_REQUESTS: CounterVec = register_counter_vec!(
        "gifview_proxy_requests_total",
        "Media proxy requests by outcome",
        &["outcome"]
    )
    .expect("Failed to create proxy_requests metric");
}

pub fn record_cache_hit(operation: &str) {
    CACHE_OPERATIONS.with_label_values(&[operation, "hit"]).inc();
}

pub fn record_cache_miss(operation: &str) {
    CACHE_OPERATIONS.with_label_values(&[operation, "miss"]).inc();
}

pub fn record_cache_store(operation: &str) {
    CACHE_OPERATIONS.with_label_values(&[operation, "stored"]).inc();
}

pub fn record_storage_error(op: &str) {
    CACHE_STORAGE_ERRORS.with_label_values(&[op]).inc();
}

pub fn record_swept(count: usize) {
    CACHE_SWEPT.inc_by(count as f64);
}

/// Record one provider call and how long it took
pub fn record_upstream(operation: &str, outcome: &str, duration_secs: f64) {
    UPSTREAM_REQUESTS
        .with_label_values(&[operation, outcome])
        .inc();
    UPSTREAM_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

pub fn record_proxy(outcome: &str) {
    PROXY_REQUESTS.with_label_values(&[outcome]).inc();
}

/// Encode all metrics as Prometheus text format
pub fn encode_metrics() -> crate::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| crate::GifviewError::Other(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| crate::GifviewError::Other(format!("Metrics are not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        record_cache_hit("search");
        record_cache_miss("search");
        record_cache_store("search");
        record_storage_error("get");
        record_swept(3);
        record_upstream("trending", "ok", 0.2);
        record_proxy("ok");

        let output = encode_metrics().unwrap();
        assert!(output.contains("gifview_cache_operations_total"));
        assert!(output.contains("gifview_cache_storage_errors_total"));
        assert!(output.contains("gifview_upstream_duration_seconds"));
    }
}
