//! HTTP API: predictions, PDF reports, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use maintenance_lib::{
    explain_best_effort,
    explain::DEFAULT_EXPLANATION_TIMEOUT,
    health::{components, ComponentStatus, HealthRegistry},
    ExplanationOutcome, ExplanationProvider, Observation, PredictionEngine,
    PredictionError, PredictionResult, RenderError, ReportInput, ReportRenderer,
    StructuredLogger, UnknownCategoryError,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub const REPORT_FILENAME: &str = "Maintenance_Report.pdf";

/// Accepted material age, in days
pub const MATERIAL_AGE_RANGE: RangeInclusive<u32> = 1..=500;

/// Accepted days since last maintenance
pub const LAST_MAINTENANCE_RANGE: RangeInclusive<u32> = 0..=300;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub engine: Arc<PredictionEngine>,
    pub explainer: Arc<dyn ExplanationProvider>,
    pub renderer: ReportRenderer,
    pub explanation_timeout: Duration,
    logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        engine: Arc<PredictionEngine>,
        explainer: Arc<dyn ExplanationProvider>,
    ) -> Self {
        Self {
            health_registry,
            engine,
            explainer,
            renderer: ReportRenderer::new(),
            explanation_timeout: DEFAULT_EXPLANATION_TIMEOUT,
            logger: StructuredLogger::new("http"),
        }
    }

    pub fn with_explanation_timeout(mut self, timeout: Duration) -> Self {
        self.explanation_timeout = timeout;
        self
    }

    async fn explain(
        &self,
        observation: &Observation,
        prediction: &PredictionResult,
    ) -> ExplanationOutcome {
        let outcome = explain_best_effort(
            self.explainer.as_ref(),
            observation,
            prediction,
            self.explanation_timeout,
        )
        .await;
        self.health_registry.record_explanation(&outcome).await;
        outcome
    }

    async fn predict(&self, observation: &Observation) -> Result<PredictionResult, ApiError> {
        validate_ranges(observation)?;
        match self.engine.predict(observation) {
            Ok(prediction) => {
                self.health_registry.set_healthy(components::MODEL).await;
                Ok(prediction)
            }
            Err(PredictionError::UnknownCategory(e)) => Err(ApiError::UnknownCategory(e)),
            Err(e) => {
                self.health_registry
                    .set_degraded(components::MODEL, e.to_string())
                    .await;
                Err(ApiError::Prediction(e))
            }
        }
    }
}

/// Request failures and their HTTP mapping
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    UnknownCategory(UnknownCategoryError),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error(transparent)]
    Prediction(PredictionError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed: Option<&'a [String]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.to_string();
        let (status, body) = match &self {
            ApiError::UnknownCategory(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error,
                    feature: Some(&e.feature),
                    value: Some(e.value.clone()),
                    allowed: Some(&e.allowed),
                },
            ),
            ApiError::OutOfRange { field, value, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error,
                    feature: Some(*field),
                    value: Some(value.to_string()),
                    allowed: None,
                },
            ),
            ApiError::Prediction(_) | ApiError::Render(_) => {
                error!(error = %error, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error,
                        feature: None,
                        value: None,
                        allowed: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

fn check_range(field: &'static str, value: u32, range: &RangeInclusive<u32>) -> Result<(), ApiError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ApiError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Numeric bounds are enforced here; the engine accepts any value.
pub fn validate_ranges(observation: &Observation) -> Result<(), ApiError> {
    check_range("material_age_days", observation.material_age_days, &MATERIAL_AGE_RANGE)?;
    check_range(
        "last_maintenance_days",
        observation.last_maintenance_days,
        &LAST_MAINTENANCE_RANGE,
    )
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: PredictionResult,
    pub explanation: String,
    pub explanation_available: bool,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(observation): Json<Observation>,
) -> Result<Json<PredictResponse>, ApiError> {
    let prediction = state.predict(&observation).await?;
    let outcome = state.explain(&observation, &prediction).await;

    Ok(Json(PredictResponse {
        explanation: outcome.text().to_string(),
        explanation_available: outcome.is_generated(),
        prediction,
    }))
}

async fn report(
    State(state): State<Arc<AppState>>,
    Json(observation): Json<Observation>,
) -> Result<Response, ApiError> {
    let prediction = state.predict(&observation).await?;
    let outcome = state.explain(&observation, &prediction).await;

    let fields = observation.report_fields();
    let input = ReportInput::new(&fields, &prediction, outcome.text());
    let (document, bytes) = state.renderer.render_pdf(&input)?;
    state
        .logger
        .log_report_rendered("http-response", document.page_count());

    let disposition = format!("attachment; filename=\"{}\"", REPORT_FILENAME);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Returns 200 while operational (degraded included), 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/v1/predict", post(predict))
        .route("/v1/report", post(report))
        .with_state(state)
}

/// Serve the API until ctrl-c
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
