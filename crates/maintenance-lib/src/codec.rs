//! Closed-vocabulary category codecs
//!
//! Each categorical feature, and the target label, is encoded by a fixed
//! class list produced at training time. The code of a value is its
//! index in the list. Values outside the list are rejected.

use crate::error::{ModelLoadError, PredictionError, UnknownCategoryError};
use crate::models::Feature;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Bidirectional string <-> code table for one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCodec {
    classes: Vec<String>,
}

impl CategoryCodec {
    /// Build from an ordered class list. The list must be non-empty and
    /// free of duplicates.
    pub fn new(classes: Vec<String>) -> Result<Self, ModelLoadError> {
        if classes.is_empty() {
            return Err(ModelLoadError::Invalid("codec has no classes".to_string()));
        }
        let mut seen = BTreeSet::new();
        for class in &classes {
            if !seen.insert(class.as_str()) {
                return Err(ModelLoadError::Invalid(format!(
                    "duplicate class {:?} in codec",
                    class
                )));
            }
        }
        Ok(Self { classes })
    }

    /// Fit a codec from raw training values: sorted, de-duplicated.
    pub fn fit<I, S>(values: I) -> Result<Self, ModelLoadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        Self::new(classes.into_iter().collect())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encode(&self, value: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == value)
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    fn encode_for(&self, feature: &str, value: &str) -> Result<usize, UnknownCategoryError> {
        self.encode(value).ok_or_else(|| UnknownCategoryError {
            feature: feature.to_string(),
            value: value.to_string(),
            allowed: self.classes.clone(),
        })
    }
}

/// Per-feature codecs plus the target codec, loaded once at startup
#[derive(Debug, Clone)]
pub struct CodecSet {
    features: HashMap<String, CategoryCodec>,
    target: CategoryCodec,
}

impl CodecSet {
    /// Assemble a codec set. Every categorical feature must have a codec.
    pub fn new(
        features: HashMap<String, CategoryCodec>,
        target: CategoryCodec,
    ) -> Result<Self, ModelLoadError> {
        for feature in Feature::CATEGORICAL {
            if !features.contains_key(feature.column_name()) {
                return Err(ModelLoadError::MissingEncoder(
                    feature.column_name().to_string(),
                ));
            }
        }
        Ok(Self { features, target })
    }

    /// Encode a categorical value of the named feature
    pub fn encode(&self, feature_name: &str, value: &str) -> Result<usize, PredictionError> {
        let codec = self.features.get(feature_name).ok_or_else(|| UnknownCategoryError {
            feature: feature_name.to_string(),
            value: value.to_string(),
            allowed: Vec::new(),
        })?;
        Ok(codec.encode_for(feature_name, value)?)
    }

    /// Decode a target label code
    pub fn decode(&self, label_code: usize) -> Result<&str, PredictionError> {
        self.target
            .decode(label_code)
            .ok_or(PredictionError::UnknownLabel {
                code: label_code,
                size: self.target.len(),
            })
    }

    /// Decode a categorical feature code
    pub fn decode_feature(&self, feature_name: &str, code: usize) -> Option<&str> {
        self.features.get(feature_name)?.decode(code)
    }

    pub fn feature(&self, feature: Feature) -> Option<&CategoryCodec> {
        self.features.get(feature.column_name())
    }

    pub fn target(&self) -> &CategoryCodec {
        &self.target
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn training_codecs() -> CodecSet {
        let levels = || CategoryCodec::fit(["Low", "Medium", "High"]).unwrap();
        let mut features = HashMap::new();
        features.insert(
            "material_type".to_string(),
            CategoryCodec::fit(["Steel", "Cement", "Brick"]).unwrap(),
        );
        features.insert("usage_frequency".to_string(), levels());
        features.insert("humidity_exposure".to_string(), levels());
        features.insert("load_stress_level".to_string(), levels());
        features.insert(
            "cracks_visible".to_string(),
            CategoryCodec::fit(["No", "Yes"]).unwrap(),
        );
        let target = CategoryCodec::fit(["Good", "Moderate", "Critical"]).unwrap();
        CodecSet::new(features, target).unwrap()
    }

    #[test]
    fn test_fit_sorts_and_dedups() {
        let codec = CategoryCodec::fit(["Steel", "Brick", "Cement", "Steel"]).unwrap();
        assert_eq!(codec.classes(), &["Brick", "Cement", "Steel"]);
        assert_eq!(codec.encode("Steel"), Some(2));
    }

    #[test]
    fn test_duplicate_classes_rejected() {
        let result = CategoryCodec::new(vec!["Low".into(), "Low".into()]);
        assert!(matches!(result, Err(ModelLoadError::Invalid(_))));
    }

    #[test]
    fn test_empty_codec_rejected() {
        assert!(CategoryCodec::new(Vec::new()).is_err());
    }

    #[test]
    fn test_round_trip_all_known_values() {
        let codecs = training_codecs();
        for feature in Feature::CATEGORICAL {
            let name = feature.column_name();
            for value in codecs.feature(feature).unwrap().classes() {
                let code = codecs.encode(name, value).unwrap();
                assert_eq!(codecs.decode_feature(name, code), Some(value.as_str()));
            }
        }
        for (code, label) in codecs.target().classes().iter().enumerate() {
            assert_eq!(codecs.decode(code).unwrap(), label);
        }
    }

    #[test]
    fn test_unknown_value_rejected() {
        let codecs = training_codecs();
        let err = codecs.encode("material_type", "Wood").unwrap_err();
        match err {
            PredictionError::UnknownCategory(e) => {
                assert_eq!(e.feature, "material_type");
                assert_eq!(e.value, "Wood");
                assert_eq!(e.allowed, vec!["Brick", "Cement", "Steel"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let codecs = training_codecs();
        assert!(codecs.encode("cracks_visible", "yes").is_err());
        assert!(codecs.encode("cracks_visible", "Yes").is_ok());
    }

    #[test]
    fn test_decode_out_of_range() {
        let codecs = training_codecs();
        assert!(matches!(
            codecs.decode(3),
            Err(PredictionError::UnknownLabel { code: 3, size: 3 })
        ));
    }

    #[test]
    fn test_missing_encoder_rejected() {
        let mut features = HashMap::new();
        features.insert(
            "material_type".to_string(),
            CategoryCodec::fit(["Steel"]).unwrap(),
        );
        let target = CategoryCodec::fit(["Good"]).unwrap();
        assert!(matches!(
            CodecSet::new(features, target),
            Err(ModelLoadError::MissingEncoder(name)) if name == "usage_frequency"
        ));
    }
}
