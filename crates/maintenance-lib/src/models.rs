//! Core data models for predictive maintenance

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of columns the classifier was trained on
pub const NUM_FEATURES: usize = 7;

/// Confidence at or above which a prediction is HIGH risk
pub const HIGH_RISK_THRESHOLD: f64 = 75.0;

/// Confidence at or above which a prediction is MEDIUM risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 40.0;

/// Model input columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    MaterialType,
    MaterialAgeDays,
    UsageFrequency,
    HumidityExposure,
    LoadStressLevel,
    CracksVisible,
    LastMaintenanceDays,
}

impl Feature {
    /// Column order used at training time. The classifier consumes
    /// feature vectors positionally in exactly this order.
    pub const COLUMNS: [Feature; NUM_FEATURES] = [
        Feature::MaterialType,
        Feature::MaterialAgeDays,
        Feature::UsageFrequency,
        Feature::HumidityExposure,
        Feature::LoadStressLevel,
        Feature::CracksVisible,
        Feature::LastMaintenanceDays,
    ];

    /// Columns that go through a category codec
    pub const CATEGORICAL: [Feature; 5] = [
        Feature::MaterialType,
        Feature::UsageFrequency,
        Feature::HumidityExposure,
        Feature::LoadStressLevel,
        Feature::CracksVisible,
    ];

    /// Column name in the training dataset
    pub fn column_name(&self) -> &'static str {
        match self {
            Feature::MaterialType => "material_type",
            Feature::MaterialAgeDays => "material_age_days",
            Feature::UsageFrequency => "usage_frequency",
            Feature::HumidityExposure => "humidity_exposure",
            Feature::LoadStressLevel => "load_stress_level",
            Feature::CracksVisible => "cracks_visible",
            Feature::LastMaintenanceDays => "last_maintenance_days",
        }
    }

    /// Label shown in the report's material identification section
    pub fn display_label(&self) -> &'static str {
        match self {
            Feature::MaterialType => "Material Type",
            Feature::MaterialAgeDays => "Material Age (days)",
            Feature::UsageFrequency => "Usage Frequency",
            Feature::HumidityExposure => "Humidity Exposure",
            Feature::LoadStressLevel => "Load Stress Level",
            Feature::CracksVisible => "Cracks Visible",
            Feature::LastMaintenanceDays => "Days Since Last Maintenance",
        }
    }

    pub fn is_categorical(&self) -> bool {
        !matches!(
            self,
            Feature::MaterialAgeDays | Feature::LastMaintenanceDays
        )
    }

    /// Column position in the feature vector
    pub fn index(&self) -> usize {
        Feature::COLUMNS
            .iter()
            .position(|f| f == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One prediction request.
///
/// Categorical values are kept as raw strings and checked against the
/// training vocabulary by the codec. Numeric ranges (age 1-500 days,
/// last maintenance 0-300 days) are enforced by the request surfaces,
/// not re-validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub material_type: String,
    pub material_age_days: u32,
    pub usage_frequency: String,
    pub humidity_exposure: String,
    pub load_stress_level: String,
    pub cracks_visible: String,
    pub last_maintenance_days: u32,
}

impl Observation {
    /// Raw string value of a categorical column, `None` for numeric ones
    pub fn categorical(&self, feature: Feature) -> Option<&str> {
        match feature {
            Feature::MaterialType => Some(&self.material_type),
            Feature::UsageFrequency => Some(&self.usage_frequency),
            Feature::HumidityExposure => Some(&self.humidity_exposure),
            Feature::LoadStressLevel => Some(&self.load_stress_level),
            Feature::CracksVisible => Some(&self.cracks_visible),
            Feature::MaterialAgeDays | Feature::LastMaintenanceDays => None,
        }
    }

    /// Raw value of a numeric column, `None` for categorical ones
    pub fn numeric(&self, feature: Feature) -> Option<u32> {
        match feature {
            Feature::MaterialAgeDays => Some(self.material_age_days),
            Feature::LastMaintenanceDays => Some(self.last_maintenance_days),
            _ => None,
        }
    }

    /// Ordered (label, value) pairs for the report
    pub fn report_fields(&self) -> Vec<(String, String)> {
        Feature::COLUMNS
            .iter()
            .map(|feature| {
                let value = match self.categorical(*feature) {
                    Some(v) => v.to_string(),
                    None => self.numeric(*feature).unwrap_or_default().to_string(),
                };
                (feature.display_label().to_string(), value)
            })
            .collect()
    }
}

/// Encoded model input, positional in `Feature::COLUMNS` order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: [f32; NUM_FEATURES],
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f32 {
        self.values[feature.index()]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// Display bucketing of prediction confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Bucket a confidence percentage. Boundary values belong to the
    /// higher tier.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if confidence >= MEDIUM_RISK_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability assigned to one target label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// Outcome of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
    pub label_code: usize,
    /// Maximum class probability as a percentage in [0, 100]
    pub confidence: f64,
    pub risk_tier: RiskTier,
    pub recommendation: String,
    pub probabilities: Vec<ClassProbability>,
    pub model_version: String,
}
