//! Error types for the maintenance pipeline

use std::path::PathBuf;
use std::time::Duration;

/// A categorical value outside the vocabulary fixed at training time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {feature} value {value:?} (expected one of: {})", .allowed.join(", "))]
pub struct UnknownCategoryError {
    pub feature: String,
    pub value: String,
    pub allowed: Vec<String>,
}

/// Failure of a single prediction request. No partial result is produced.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),

    /// The classifier failed to run
    #[error("classifier error: {0}")]
    Classifier(String),

    /// The classifier returned a distribution the target vocabulary cannot explain
    #[error("invalid class distribution: {0}")]
    DistributionMismatch(String),

    /// A label code with no entry in the target vocabulary
    #[error("label code {code} is outside the target vocabulary of {size} labels")]
    UnknownLabel { code: usize, size: usize },
}

impl PredictionError {
    /// Short stable label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            PredictionError::UnknownCategory(_) => "unknown_category",
            PredictionError::Classifier(_) => "classifier",
            PredictionError::DistributionMismatch(_) => "distribution_mismatch",
            PredictionError::UnknownLabel { .. } => "unknown_label",
        }
    }
}

/// Failure to load the frozen model artifacts. Fatal to process start.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to read artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    Checksum {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("failed to load ONNX model: {0}")]
    Onnx(String),

    #[error("missing encoder for feature {0}")]
    MissingEncoder(String),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Failure of the external explanation service. Never propagated past
/// the best-effort wrapper; mapped to the placeholder text.
#[derive(Debug, thiserror::Error)]
pub enum ExplanationError {
    #[error("explanation service not configured")]
    NotConfigured,

    #[error("explanation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("explanation request failed: {0}")]
    Transport(String),

    #[error("explanation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed explanation response: {0}")]
    MalformedResponse(String),

    #[error("explanation service returned no text")]
    EmptyResponse,
}

impl ExplanationError {
    /// Short stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ExplanationError::NotConfigured => "not_configured",
            ExplanationError::Timeout(_) => "timeout",
            ExplanationError::Transport(_) => "transport",
            ExplanationError::Status { status, .. } if *status == 401 || *status == 403 => "auth",
            ExplanationError::Status { status, .. } if *status == 429 => "quota",
            ExplanationError::Status { .. } => "status",
            ExplanationError::MalformedResponse(_) => "malformed",
            ExplanationError::EmptyResponse => "empty",
        }
    }
}

/// Failure to produce the report file
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write report to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode report: {0}")]
    Encoding(#[from] std::io::Error),
}
