//! ONNX inference using tract
//!
//! Runs a classifier exported to ONNX (ZipMap disabled, so class
//! probabilities come out as a plain `float[1, n_classes]` tensor).

use super::Classifier;
use crate::error::{ModelLoadError, PredictionError};
use crate::models::{FeatureVector, NUM_FEATURES};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based classifier using tract for lightweight inference
pub struct OnnxClassifier {
    model: TractModel,
    model_version: String,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl OnnxClassifier {
    /// Create a classifier from model bytes
    pub fn new(model_bytes: &[u8], model_version: impl Into<String>) -> Result<Self, ModelLoadError> {
        let model = Self::load_model(model_bytes)
            .map_err(|e| ModelLoadError::Onnx(format!("{:#}", e)))?;
        Ok(Self {
            model,
            model_version: model_version.into(),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8]) -> TractResult<TractModel> {
        tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())?
            .into_optimized()?
            .into_runnable()
    }

    fn features_to_tensor(features: &FeatureVector) -> TractResult<Tensor> {
        let array = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), features.values.to_vec())?;
        Ok(array.into())
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn predict_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictionError> {
        let start = Instant::now();
        let classifier_err = |e: TractError| PredictionError::Classifier(format!("{:#}", e));

        let input = Self::features_to_tensor(features).map_err(classifier_err)?;
        let outputs = self.model.run(tvec!(input.into())).map_err(classifier_err)?;
        // [label, probabilities] for sklearn exports; the probabilities come last
        let probabilities = outputs
            .last()
            .ok_or_else(|| PredictionError::Classifier("no output from model".to_string()))?;
        let view = probabilities.to_array_view::<f32>().map_err(classifier_err)?;
        let distribution: Vec<f64> = view.iter().map(|p| f64::from(*p)).collect();

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(distribution)
    }

    fn num_classes(&self) -> Option<usize> {
        None
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }

    fn format(&self) -> &'static str {
        "onnx"
    }
}

/// Inference statistics
#[derive(Debug, Clone)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}
