//! Prometheus metrics for artifact-service.
//!
//! Provides request, inference and storage metrics for observability.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{Once, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Pipeline metrics
pub static ARTIFACT_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ARTIFACT_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Inference metrics
pub static INFERENCE_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static INFERENCE_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Storage metrics
pub static STORAGE_WRITES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

static INIT: Once = Once::new();

/// Initialize all metrics. Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("artifact_requests_total", "Total artifact generation requests"),
        &["kind", "status"],
    )
    .expect("Failed to create artifact_requests_total metric");

    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "artifact_request_duration_seconds",
            "End-to-end pipeline duration in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["kind"],
    )
    .expect("Failed to create artifact_request_duration_seconds metric");

    let inference_latency = HistogramVec::new(
        HistogramOpts::new(
            "inference_latency_seconds",
            "Inference service latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["model"],
    )
    .expect("Failed to create inference_latency_seconds metric");

    let inference_errors = IntCounterVec::new(
        Opts::new("inference_errors_total", "Total inference errors"),
        &["model", "error_type"],
    )
    .expect("Failed to create inference_errors_total metric");

    let storage_writes = IntCounterVec::new(
        Opts::new("storage_writes_total", "Total artifact writes to the object store"),
        &["kind", "result"],
    )
    .expect("Failed to create storage_writes_total metric");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("Failed to register artifact_requests_total");
    registry
        .register(Box::new(request_duration.clone()))
        .expect("Failed to register artifact_request_duration_seconds");
    registry
        .register(Box::new(inference_latency.clone()))
        .expect("Failed to register inference_latency_seconds");
    registry
        .register(Box::new(inference_errors.clone()))
        .expect("Failed to register inference_errors_total");
    registry
        .register(Box::new(storage_writes.clone()))
        .expect("Failed to register storage_writes_total");

    let _ = REGISTRY.set(registry);
    let _ = ARTIFACT_REQUESTS_TOTAL.set(requests_total);
    let _ = ARTIFACT_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = INFERENCE_LATENCY_SECONDS.set(inference_latency);
    let _ = INFERENCE_ERRORS_TOTAL.set(inference_errors);
    let _ = STORAGE_WRITES_TOTAL.set(storage_writes);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a finished pipeline run.
pub fn record_request(kind: &str, status: u16, duration_secs: f64) {
    if let Some(counter) = ARTIFACT_REQUESTS_TOTAL.get() {
        let status = status.to_string();
        counter.with_label_values(&[kind, status.as_str()]).inc();
    }
    if let Some(histogram) = ARTIFACT_REQUEST_DURATION_SECONDS.get() {
        histogram.with_label_values(&[kind]).observe(duration_secs);
    }
}

/// Record inference latency.
pub fn record_inference_latency(model: &str, duration_secs: f64) {
    if let Some(histogram) = INFERENCE_LATENCY_SECONDS.get() {
        histogram.with_label_values(&[model]).observe(duration_secs);
    }
}

/// Record an inference error.
pub fn record_inference_error(model: &str, error_type: &str) {
    if let Some(counter) = INFERENCE_ERRORS_TOTAL.get() {
        counter.with_label_values(&[model, error_type]).inc();
    }
}

/// Record an object store write and whether it succeeded.
pub fn record_storage_write(kind: &str, success: bool) {
    if let Some(counter) = STORAGE_WRITES_TOTAL.get() {
        let result = if success { "ok" } else { "error" };
        counter.with_label_values(&[kind, result]).inc();
    }
}
