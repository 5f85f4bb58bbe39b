//! Prediction engine: encode, classify, decode, score

use super::{Classifier, FeatureEncoder, OutputFormatter};
use crate::codec::CodecSet;
use crate::error::{ModelLoadError, PredictionError};
use crate::models::{Observation, PredictionResult};
use crate::observability::{MaintenanceMetrics, StructuredLogger};
use std::sync::Arc;
use std::time::Instant;

/// Runs predictions against a frozen classifier and its codecs.
///
/// Built once at startup and shared behind an `Arc`; nothing in here is
/// mutated per request.
pub struct PredictionEngine {
    classifier: Arc<dyn Classifier>,
    codecs: CodecSet,
    metrics: MaintenanceMetrics,
    logger: StructuredLogger,
}

impl PredictionEngine {
    /// Create an engine. Fails if the classifier and the target codec
    /// disagree on the number of labels.
    pub fn new(classifier: Arc<dyn Classifier>, codecs: CodecSet) -> Result<Self, ModelLoadError> {
        if let Some(n_classes) = classifier.num_classes() {
            if n_classes != codecs.target().len() {
                return Err(ModelLoadError::Invalid(format!(
                    "classifier predicts {} classes but the target encoder has {} labels",
                    n_classes,
                    codecs.target().len()
                )));
            }
        }
        let metrics = MaintenanceMetrics::new();
        metrics.set_model_info(classifier.model_version(), classifier.format());
        Ok(Self {
            classifier,
            codecs,
            metrics,
            logger: StructuredLogger::new("prediction-engine"),
        })
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Predict the maintenance condition of one observation
    pub fn predict(&self, observation: &Observation) -> Result<PredictionResult, PredictionError> {
        let start = Instant::now();
        let result = self.run(observation);
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());

        match &result {
            Ok(prediction) => {
                self.metrics.inc_predictions(&prediction.label);
                self.logger.log_prediction(observation, prediction);
            }
            Err(e) => {
                self.metrics.inc_prediction_errors(e.reason());
                self.logger.log_prediction_rejected(e);
            }
        }
        result
    }

    fn run(&self, observation: &Observation) -> Result<PredictionResult, PredictionError> {
        let features = FeatureEncoder::new(&self.codecs).encode(observation)?;
        let distribution = self.classifier.predict_probabilities(&features)?;
        OutputFormatter::new(&self.codecs).format(&distribution, self.classifier.model_version())
    }

    pub fn codecs(&self) -> &CodecSet {
        &self.codecs
    }

    pub fn model_version(&self) -> &str {
        self.classifier.model_version()
    }

    pub fn model_format(&self) -> &'static str {
        self.classifier.format()
    }
}
