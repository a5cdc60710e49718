//! Discovery Metrics
//!
//! Prometheus metrics for the HTTP surface, store reads, fallbacks and the
//! session caches. Everything registers into the default registry and is
//! exposed by `serve_metrics`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, Encoder,
    HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};
use std::time::Duration;

lazy_static! {
    static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "discovery_http_requests_total",
        "Total HTTP requests handled by discovery-service",
        &["method", "path", "status"]
    )
    .expect("Failed to register discovery_http_requests_total");

    static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "discovery_http_request_duration_seconds",
        "HTTP request latency for discovery-service",
        &["method", "path", "status"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register discovery_http_request_duration_seconds");

    static ref STORE_LATENCY_SECONDS: HistogramVec = register_histogram_vec!(
        "discovery_store_latency_seconds",
        "Latency of store reads by operation",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0]
    )
    .expect("Failed to register discovery_store_latency_seconds");

    static ref FALLBACK_TOTAL: IntCounterVec = register_int_counter_vec!(
        "discovery_fallback_total",
        "Responses served from degraded data",
        &["endpoint", "reason"]
    )
    .expect("Failed to register discovery_fallback_total");

    static ref SESSION_ENTRIES: IntGaugeVec = register_int_gauge_vec!(
        "discovery_session_entries",
        "Live session entries per cache namespace",
        &["namespace"]
    )
    .expect("Failed to register discovery_session_entries");

    static ref SESSION_EVICTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "discovery_session_evictions_total",
        "Session entries removed by the sweeper",
        &["namespace"]
    )
    .expect("Failed to register discovery_session_evictions_total");
}

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn observe_store_latency(operation: &str, elapsed: Duration) {
    STORE_LATENCY_SECONDS
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
}

/// Count a degraded response (`endpoint` is the route family, `reason` a short label)
pub fn record_fallback(endpoint: &str, reason: &str) {
    FALLBACK_TOTAL.with_label_values(&[endpoint, reason]).inc();
}

pub fn set_session_entries(namespace: &str, count: usize) {
    SESSION_ENTRIES
        .with_label_values(&[namespace])
        .set(count as i64);
}

pub fn record_session_evictions(namespace: &str, count: usize) {
    SESSION_EVICTIONS_TOTAL
        .with_label_values(&[namespace])
        .inc_by(count as u64);
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_counter_increments() {
        let before = FALLBACK_TOTAL
            .with_label_values(&["recommendations", "timeout"])
            .get();
        record_fallback("recommendations", "timeout");
        let after = FALLBACK_TOTAL
            .with_label_values(&["recommendations", "timeout"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_session_gauge_tracks_latest_value() {
        set_session_entries("unit-test", 7);
        assert_eq!(SESSION_ENTRIES.with_label_values(&["unit-test"]).get(), 7);
        set_session_entries("unit-test", 2);
        assert_eq!(SESSION_ENTRIES.with_label_values(&["unit-test"]).get(), 2);
    }
}
