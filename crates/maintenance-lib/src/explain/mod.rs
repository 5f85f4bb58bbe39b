//! Best-effort natural-language explanations
//!
//! The explanation service is external and may fail for any reason. The
//! report pipeline never fails because of it: a failure is replaced by a
//! fixed placeholder and recorded in logs and metrics.

mod groq;

pub use groq::{
    build_prompt, GroqConfig, GroqExplainer, DEFAULT_GROQ_BASE_URL, DEFAULT_GROQ_MODEL,
    GROQ_API_KEY_ENV,
};

use crate::error::ExplanationError;
use crate::models::{Observation, PredictionResult};
use crate::observability::{MaintenanceMetrics, StructuredLogger};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Text used in place of an explanation that could not be generated
pub const EXPLANATION_PLACEHOLDER: &str = "AI explanation unavailable.";

/// Default upper bound on a single explanation attempt
pub const DEFAULT_EXPLANATION_TIMEOUT: Duration = Duration::from_secs(20);

/// External explanation generator
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn explain(
        &self,
        observation: &Observation,
        prediction: &PredictionResult,
    ) -> Result<String, ExplanationError>;
}

/// Provider used when no explanation service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledExplainer;

#[async_trait]
impl ExplanationProvider for DisabledExplainer {
    async fn explain(&self, _: &Observation, _: &PredictionResult) -> Result<String, ExplanationError> {
        Err(ExplanationError::NotConfigured)
    }
}

/// Result of one best-effort explanation attempt
#[derive(Debug)]
pub enum ExplanationOutcome {
    Generated(String),
    Unavailable(ExplanationError),
}

impl ExplanationOutcome {
    /// Text to place in the report
    pub fn text(&self) -> &str {
        match self {
            ExplanationOutcome::Generated(text) => text,
            ExplanationOutcome::Unavailable(_) => EXPLANATION_PLACEHOLDER,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ExplanationOutcome::Generated(_))
    }

    pub fn error(&self) -> Option<&ExplanationError> {
        match self {
            ExplanationOutcome::Generated(_) => None,
            ExplanationOutcome::Unavailable(e) => Some(e),
        }
    }
}

/// Make a single explanation attempt bounded by `timeout`.
///
/// Never fails: any error becomes `ExplanationOutcome::Unavailable`.
pub async fn explain_best_effort(
    provider: &dyn ExplanationProvider,
    observation: &Observation,
    prediction: &PredictionResult,
    timeout: Duration,
) -> ExplanationOutcome {
    let result = match tokio::time::timeout(timeout, provider.explain(observation, prediction)).await {
        Ok(Ok(text)) if text.trim().is_empty() => Err(ExplanationError::EmptyResponse),
        Ok(result) => result,
        Err(_) => Err(ExplanationError::Timeout(timeout)),
    };

    match result {
        Ok(text) => {
            debug!(chars = text.len(), "Explanation generated");
            ExplanationOutcome::Generated(text)
        }
        Err(e) => {
            // A missing API key is not a service failure
            if !matches!(e, ExplanationError::NotConfigured) {
                MaintenanceMetrics::new().inc_explanation_failures(e.kind());
            }
            StructuredLogger::new("explanation").log_explanation_unavailable(&e);
            ExplanationOutcome::Unavailable(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskTier;

    struct FixedExplainer(&'static str);

    #[async_trait]
    impl ExplanationProvider for FixedExplainer {
        async fn explain(&self, _: &Observation, _: &PredictionResult) -> Result<String, ExplanationError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingExplainer;

    #[async_trait]
    impl ExplanationProvider for FailingExplainer {
        async fn explain(&self, _: &Observation, _: &PredictionResult) -> Result<String, ExplanationError> {
            Err(ExplanationError::Status {
                status: 401,
                body: "invalid api key".to_string(),
            })
        }
    }

    struct HangingExplainer;

    #[async_trait]
    impl ExplanationProvider for HangingExplainer {
        async fn explain(&self, _: &Observation, _: &PredictionResult) -> Result<String, ExplanationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    fn inputs() -> (Observation, PredictionResult) {
        let observation = Observation {
            material_type: "Brick".to_string(),
            material_age_days: 300,
            usage_frequency: "High".to_string(),
            humidity_exposure: "High".to_string(),
            load_stress_level: "High".to_string(),
            cracks_visible: "Yes".to_string(),
            last_maintenance_days: 250,
        };
        let prediction = PredictionResult {
            label: "Critical".to_string(),
            label_code: 0,
            confidence: 81.0,
            risk_tier: RiskTier::High,
            recommendation: "Immediate replacement required.".to_string(),
            probabilities: Vec::new(),
            model_version: "v1".to_string(),
        };
        (observation, prediction)
    }

    #[tokio::test]
    async fn test_generated_text_passes_through() {
        let (obs, pred) = inputs();
        let outcome =
            explain_best_effort(&FixedExplainer("Severe cracking."), &obs, &pred, DEFAULT_EXPLANATION_TIMEOUT).await;
        assert!(outcome.is_generated());
        assert_eq!(outcome.text(), "Severe cracking.");
    }

    #[tokio::test]
    async fn test_failure_yields_placeholder() {
        let (obs, pred) = inputs();
        let outcome = explain_best_effort(&FailingExplainer, &obs, &pred, DEFAULT_EXPLANATION_TIMEOUT).await;
        assert!(!outcome.is_generated());
        assert_eq!(outcome.text(), EXPLANATION_PLACEHOLDER);
        assert_eq!(outcome.error().map(|e| e.kind()), Some("auth"));
    }

    #[tokio::test]
    async fn test_blank_text_is_treated_as_failure() {
        let (obs, pred) = inputs();
        let outcome = explain_best_effort(&FixedExplainer("  \n "), &obs, &pred, DEFAULT_EXPLANATION_TIMEOUT).await;
        assert_eq!(outcome.text(), EXPLANATION_PLACEHOLDER);
        assert!(matches!(outcome.error(), Some(ExplanationError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_timeout_yields_placeholder() {
        let (obs, pred) = inputs();
        let outcome = explain_best_effort(&HangingExplainer, &obs, &pred, Duration::from_millis(50)).await;
        assert!(matches!(outcome.error(), Some(ExplanationError::Timeout(_))));
        assert_eq!(outcome.text(), EXPLANATION_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_disabled_explainer_is_not_configured() {
        let (obs, pred) = inputs();
        let outcome = explain_best_effort(&DisabledExplainer, &obs, &pred, DEFAULT_EXPLANATION_TIMEOUT).await;
        assert!(matches!(outcome.error(), Some(ExplanationError::NotConfigured)));
    }
}
