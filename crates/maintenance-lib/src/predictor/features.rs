//! Feature encoding for ML inference
//!
//! Turns a raw observation into the positional feature vector the
//! classifier was trained on. Categorical columns go through the
//! training-time codecs; numeric columns pass through unchanged.

use crate::codec::CodecSet;
use crate::error::PredictionError;
use crate::models::{Feature, FeatureVector, Observation, NUM_FEATURES};
use tracing::debug;

/// Encodes observations into feature vectors
pub struct FeatureEncoder<'a> {
    codecs: &'a CodecSet,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(codecs: &'a CodecSet) -> Self {
        Self { codecs }
    }

    /// Encode every column, failing on the first value outside its
    /// vocabulary. Nothing is returned unless all columns encode.
    pub fn encode(&self, observation: &Observation) -> Result<FeatureVector, PredictionError> {
        let mut values = [0.0f32; NUM_FEATURES];
        for (slot, feature) in values.iter_mut().zip(Feature::COLUMNS) {
            *slot = match observation.categorical(feature) {
                Some(raw) => self.codecs.encode(feature.column_name(), raw)? as f32,
                None => observation.numeric(feature).unwrap_or_default() as f32,
            };
        }
        debug!(features = ?values, "Encoded observation");
        Ok(FeatureVector { values })
    }
}
