//! Observability infrastructure for predictive maintenance
//!
//! Provides:
//! - Prometheus metrics (prediction latency and outcomes, explanation
//!   failures, rendered reports, model version)
//! - Structured JSON logging with tracing

use crate::error::{ExplanationError, PredictionError};
use crate::models::{Observation, PredictionResult};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MetricsInner> = OnceLock::new();

struct MetricsInner {
    predictions: IntCounterVec,
    prediction_errors: IntCounterVec,
    prediction_latency_seconds: Histogram,
    explanation_failures: IntCounterVec,
    reports_rendered: IntCounter,
    report_pages: IntGauge,
    model_info: GaugeVec,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            predictions: register_int_counter_vec!(
                "pdm_predictions_total",
                "Predictions generated, by predicted label",
                &["label"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter_vec!(
                "pdm_prediction_errors_total",
                "Rejected or failed predictions, by reason",
                &["reason"]
            )
            .expect("Failed to register prediction_errors_total"),

            prediction_latency_seconds: register_histogram!(
                "pdm_prediction_latency_seconds",
                "Time spent encoding and classifying one observation",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            explanation_failures: register_int_counter_vec!(
                "pdm_explanation_failures_total",
                "Explanation requests replaced by the placeholder, by failure kind",
                &["kind"]
            )
            .expect("Failed to register explanation_failures_total"),

            reports_rendered: register_int_counter!(
                "pdm_reports_rendered_total",
                "Reports rendered"
            )
            .expect("Failed to register reports_rendered_total"),

            report_pages: register_int_gauge!(
                "pdm_report_pages",
                "Page count of the most recently rendered report"
            )
            .expect("Failed to register report_pages"),

            model_info: register_gauge_vec!(
                "pdm_model_info",
                "Information about the loaded classifier",
                &["version", "format"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide metrics.
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct MaintenanceMetrics {
    _private: (),
}

impl Default for MaintenanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MaintenanceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MetricsInner {
        GLOBAL_METRICS.get_or_init(MetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, label: &str) {
        self.inner().predictions.with_label_values(&[label]).inc();
    }

    pub fn inc_prediction_errors(&self, reason: &str) {
        self.inner().prediction_errors.with_label_values(&[reason]).inc();
    }

    pub fn inc_explanation_failures(&self, kind: &str) {
        self.inner().explanation_failures.with_label_values(&[kind]).inc();
    }

    pub fn record_report(&self, pages: usize) {
        self.inner().reports_rendered.inc();
        self.inner().report_pages.set(pages as i64);
    }

    /// Update model info, replacing any previous version label
    pub fn set_model_info(&self, version: &str, format: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[version, format])
            .set(1.0);
    }

    pub fn explanation_failures(&self, kind: &str) -> u64 {
        self.inner().explanation_failures.with_label_values(&[kind]).get()
    }
}

/// Structured logger for maintenance events
///
/// Keeps field names consistent across the engine, the server and the CLI.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_version: &str, model_format: &str) {
        info!(
            event = "service_started",
            component = %self.component,
            service_version = %version,
            model_version = %model_version,
            model_format = %model_format,
            "Predictive maintenance service started"
        );
    }

    pub fn log_prediction(&self, observation: &Observation, prediction: &PredictionResult) {
        info!(
            event = "prediction_generated",
            component = %self.component,
            material_type = %observation.material_type,
            material_age_days = observation.material_age_days,
            label = %prediction.label,
            confidence = prediction.confidence,
            risk_tier = %prediction.risk_tier,
            model_version = %prediction.model_version,
            "Generated maintenance prediction"
        );
    }

    pub fn log_prediction_rejected(&self, error: &PredictionError) {
        warn!(
            event = "prediction_rejected",
            component = %self.component,
            reason = error.reason(),
            error = %error,
            "Prediction rejected"
        );
    }

    /// A missing API key is an operator choice and logs at debug only
    pub fn log_explanation_unavailable(&self, error: &ExplanationError) {
        if matches!(error, ExplanationError::NotConfigured) {
            debug!(
                event = "explanation_unavailable",
                component = %self.component,
                kind = error.kind(),
                "Explanation service not configured, using placeholder"
            );
            return;
        }
        warn!(
            event = "explanation_unavailable",
            component = %self.component,
            kind = error.kind(),
            error = %error,
            "Explanation unavailable, using placeholder"
        );
    }

    pub fn log_report_rendered(&self, destination: &str, pages: usize) {
        info!(
            event = "report_rendered",
            component = %self.component,
            destination = %destination,
            pages = pages,
            "Maintenance report rendered"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            component = %self.component,
            reason = %reason,
            "Predictive maintenance service shutting down"
        );
    }
}
