//! `pdm report`: predict, explain (best effort) and write the PDF

use anyhow::{Context, Result};
use maintenance_lib::{
    explain_best_effort, DisabledExplainer, ExplanationError, ExplanationProvider, GroqConfig,
    GroqExplainer, Observation, PredictionEngine, PredictionResult, ReportInput, ReportRenderer,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::output::{print_json, print_prediction, print_success, print_warning, OutputFormat};

pub struct ReportOptions {
    pub output: PathBuf,
    /// Call the explanation service; off means placeholder text
    pub explain: bool,
    pub groq_model: Option<String>,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    output: String,
    pages: usize,
    explanation_available: bool,
    prediction: &'a PredictionResult,
}

fn build_explainer(options: &ReportOptions) -> Box<dyn ExplanationProvider> {
    if !options.explain {
        return Box::new(DisabledExplainer);
    }
    let Some(mut groq) = GroqConfig::from_env() else {
        print_warning("GROQ_API_KEY not set, the report will use the placeholder explanation");
        return Box::new(DisabledExplainer);
    };
    groq = groq.with_timeout(options.timeout);
    if let Some(model) = &options.groq_model {
        groq = groq.with_model(model.clone());
    }
    debug!(model = %groq.model, "Using Groq for explanations");
    explainer_or_disabled(GroqExplainer::new(groq))
}

/// A client that cannot be built degrades to the placeholder explanation
fn explainer_or_disabled(
    client: Result<GroqExplainer, ExplanationError>,
) -> Box<dyn ExplanationProvider> {
    match client {
        Ok(explainer) => Box::new(explainer),
        Err(e) => {
            print_warning(&format!(
                "Failed to build explanation client ({}), the report will use the placeholder explanation",
                e
            ));
            Box::new(DisabledExplainer)
        }
    }
}

pub async fn run(
    engine: &PredictionEngine,
    observation: &Observation,
    options: &ReportOptions,
    format: OutputFormat,
) -> Result<()> {
    // A rejected observation stops here, before any file is touched
    let prediction = engine.predict(observation)?;

    let explainer = build_explainer(options);
    let outcome =
        explain_best_effort(explainer.as_ref(), observation, &prediction, options.timeout).await;
    if let Some(err) = outcome.error() {
        if !matches!(err, ExplanationError::NotConfigured) {
            print_warning(&format!(
                "AI explanation unavailable ({}), using placeholder",
                err.kind()
            ));
        }
    }

    let fields = observation.report_fields();
    let input = ReportInput::new(&fields, &prediction, outcome.text());
    let document = ReportRenderer::new()
        .render_to(&options.output, &input)
        .with_context(|| format!("Failed to write report to {}", options.output.display()))?;

    match format {
        OutputFormat::Json => print_json(&ReportSummary {
            output: options.output.display().to_string(),
            pages: document.page_count(),
            explanation_available: outcome.is_generated(),
            prediction: &prediction,
        })?,
        OutputFormat::Table => {
            print_prediction(&prediction);
            println!();
            print_success(&format!(
                "Report written to {} ({} page{})",
                options.output.display(),
                document.page_count(),
                if document.page_count() == 1 { "" } else { "s" }
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maintenance_lib::{RiskTier, EXPLANATION_PLACEHOLDER};

    fn inputs() -> (Observation, PredictionResult) {
        let observation = Observation {
            material_type: "Steel".to_string(),
            material_age_days: 60,
            usage_frequency: "Medium".to_string(),
            humidity_exposure: "Medium".to_string(),
            load_stress_level: "Medium".to_string(),
            cracks_visible: "No".to_string(),
            last_maintenance_days: 45,
        };
        let prediction = PredictionResult {
            label: "Good".to_string(),
            label_code: 1,
            confidence: 92.3,
            risk_tier: RiskTier::High,
            recommendation: "No maintenance required.".to_string(),
            probabilities: Vec::new(),
            model_version: "unversioned".to_string(),
        };
        (observation, prediction)
    }

    #[tokio::test]
    async fn test_client_build_failure_falls_back_to_placeholder() {
        let (observation, prediction) = inputs();
        let explainer =
            explainer_or_disabled(Err(ExplanationError::Transport("no TLS backend".to_string())));
        let outcome =
            explain_best_effort(explainer.as_ref(), &observation, &prediction, Duration::from_secs(1))
                .await;
        assert!(matches!(outcome.error(), Some(ExplanationError::NotConfigured)));
        assert_eq!(outcome.text(), EXPLANATION_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_no_explain_uses_disabled_explainer() {
        let (observation, prediction) = inputs();
        let options = ReportOptions {
            output: PathBuf::from("unused.pdf"),
            explain: false,
            groq_model: None,
            timeout: Duration::from_secs(1),
        };
        let explainer = build_explainer(&options);
        let outcome =
            explain_best_effort(explainer.as_ref(), &observation, &prediction, options.timeout)
                .await;
        assert!(!outcome.is_generated());
    }
}
