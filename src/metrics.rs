//! Prometheus metrics for engine operations.
//!
//! Entirely optional: embedders that want observability call [`init`] once
//! at startup and scrape [`gather_metrics`] from their own exporter; the
//! engine records into the counters only when they are registered.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The registry backing all engine metrics.
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Engine operations processed, labeled by operation name.
pub static OPERATIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Engine operation failures, labeled by operation name and error code.
pub static OPERATION_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before any operations run.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        OPERATIONS,
        IntCounterVec::new(
            Opts::new("roster_operations_total", "Engine operations processed"),
            &["operation"]
        )
    );
    register!(
        OPERATION_ERRORS,
        IntCounterVec::new(
            Opts::new("roster_operation_errors_total", "Engine operation failures"),
            &["operation", "error"]
        )
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record an operation execution.
#[inline]
pub fn record_operation(operation: &str) {
    if let Some(c) = OPERATIONS.get() {
        c.with_label_values(&[operation]).inc();
    }
}

/// Record an operation failure.
#[inline]
pub fn record_operation_error(operation: &str, error: &str) {
    if let Some(c) = OPERATION_ERRORS.get() {
        c.with_label_values(&[operation, error]).inc();
    }
}
