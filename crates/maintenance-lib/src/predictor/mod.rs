//! ML prediction engine

mod engine;
mod features;
mod forest;
mod inference;
mod output;

pub use engine::PredictionEngine;
pub use features::FeatureEncoder;
pub use forest::{DecisionTree, ForestClassifier, TreeNode};
pub use inference::{InferenceStats, OnnxClassifier};
pub use output::{
    argmax, recommendation_for, OutputFormatter, IMMEDIATE_REPLACEMENT, NO_MAINTENANCE,
    SCHEDULE_MAINTENANCE,
};

use crate::error::PredictionError;
use crate::models::FeatureVector;

/// Trait for frozen classifier implementations.
///
/// Implementations are immutable after load and shared read-only across
/// requests.
pub trait Classifier: Send + Sync {
    /// Probability for each target label code, indexed by code
    fn predict_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictionError>;

    /// Most probable label code, lowest code on ties
    fn predict(&self, features: &FeatureVector) -> Result<usize, PredictionError> {
        let distribution = self.predict_probabilities(features)?;
        argmax(&distribution)
            .ok_or_else(|| PredictionError::Classifier("empty class distribution".to_string()))
    }

    /// Number of target classes, when the model format records it
    fn num_classes(&self) -> Option<usize>;

    fn model_version(&self) -> &str;

    /// Artifact format name, for logs and metrics
    fn format(&self) -> &'static str;
}
