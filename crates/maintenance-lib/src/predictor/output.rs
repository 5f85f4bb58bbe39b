//! Prediction output post-processing
//!
//! Turns the classifier's class distribution into the predicted label,
//! a confidence percentage, the display risk tier, and the maintenance
//! recommendation.

use crate::codec::CodecSet;
use crate::error::PredictionError;
use crate::models::{ClassProbability, PredictionResult, RiskTier};

/// Tolerance when checking that a distribution sums to one
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-3;

pub const NO_MAINTENANCE: &str = "No maintenance required.";
pub const SCHEDULE_MAINTENANCE: &str = "Schedule maintenance soon.";
pub const IMMEDIATE_REPLACEMENT: &str = "Immediate replacement required.";

/// Recommendation for a decoded label. Depends on the label only.
pub fn recommendation_for(label: &str) -> &'static str {
    match label {
        "Good" => NO_MAINTENANCE,
        "Moderate" => SCHEDULE_MAINTENANCE,
        _ => IMMEDIATE_REPLACEMENT,
    }
}

/// Index of the largest probability. Ties go to the lowest index.
pub fn argmax(distribution: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in distribution.iter().copied().enumerate() {
        match best {
            Some((_, max)) if p <= max => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
}

/// Formats raw class distributions into a PredictionResult
pub struct OutputFormatter<'a> {
    codecs: &'a CodecSet,
}

impl<'a> OutputFormatter<'a> {
    pub fn new(codecs: &'a CodecSet) -> Self {
        Self { codecs }
    }

    /// Format a class distribution (one probability per target code)
    pub fn format(
        &self,
        distribution: &[f64],
        model_version: &str,
    ) -> Result<PredictionResult, PredictionError> {
        self.check_distribution(distribution)?;

        let label_code = argmax(distribution)
            .ok_or_else(|| PredictionError::DistributionMismatch("empty distribution".to_string()))?;
        let label = self.codecs.decode(label_code)?.to_string();
        let confidence = Self::confidence(distribution[label_code]);

        let probabilities = distribution
            .iter()
            .zip(self.codecs.target().classes())
            .map(|(p, label)| ClassProbability {
                label: label.clone(),
                probability: *p,
            })
            .collect();

        Ok(PredictionResult {
            recommendation: recommendation_for(&label).to_string(),
            risk_tier: RiskTier::from_confidence(confidence),
            label,
            label_code,
            confidence,
            probabilities,
            model_version: model_version.to_string(),
        })
    }

    /// Maximum class probability as a percentage in [0, 100]
    fn confidence(max_probability: f64) -> f64 {
        (max_probability * 100.0).clamp(0.0, 100.0)
    }

    fn check_distribution(&self, distribution: &[f64]) -> Result<(), PredictionError> {
        let expected = self.codecs.target().len();
        if distribution.len() != expected {
            return Err(PredictionError::DistributionMismatch(format!(
                "{} probabilities for {} target labels",
                distribution.len(),
                expected
            )));
        }
        if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(PredictionError::DistributionMismatch(
                "non-finite or negative probability".to_string(),
            ));
        }
        let total: f64 = distribution.iter().sum();
        if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(PredictionError::DistributionMismatch(format!(
                "probabilities sum to {:.4}",
                total
            )));
        }
        Ok(())
    }
}
