//! Predictive maintenance library for construction materials
//!
//! This crate provides the core functionality for:
//! - Encoding material observations with the training-time vocabularies
//! - Condition classification (random forest JSON or ONNX)
//! - Best-effort explanations from an external language model
//! - Paginated PDF maintenance reports
//! - Health checks and observability

pub mod artifacts;
pub mod codec;
pub mod error;
pub mod explain;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod report;

pub use artifacts::{ArtifactManifest, ClassifierFormat, ModelArtifacts};
pub use codec::{CategoryCodec, CodecSet};
pub use error::{
    ExplanationError, ModelLoadError, PredictionError, RenderError, UnknownCategoryError,
};
pub use explain::{
    explain_best_effort, DisabledExplainer, ExplanationOutcome, ExplanationProvider,
    GroqConfig, GroqExplainer, EXPLANATION_PLACEHOLDER,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MaintenanceMetrics, StructuredLogger};
pub use predictor::{Classifier, PredictionEngine};
pub use report::{ReportDocument, ReportInput, ReportRenderer};
