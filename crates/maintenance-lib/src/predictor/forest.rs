//! Random-forest classifier evaluated from a JSON export
//!
//! Format:
//! ```json
//! {
//!   "n_classes": 3,
//!   "n_features": 7,
//!   "trees": [
//!     {"nodes": [
//!       {"left": 1, "right": 2, "feature": 5, "threshold": 0.5},
//!       {"left": -1, "right": -1, "value": [12.0, 3.0, 0.0]},
//!       {"left": -1, "right": -1, "value": [0.0, 4.0, 9.0]}
//!     ]}
//!   ]
//! }
//! ```
//!
//! A node with `left == -1` is a leaf. Split nodes send a sample left when
//! `x[feature] <= threshold`. Leaf values are per-class sample counts or
//! fractions; each tree's leaf is normalized and the forest averages them.

use super::Classifier;
use crate::error::{ModelLoadError, PredictionError};
use crate::models::{FeatureVector, NUM_FEATURES};
use serde::{Deserialize, Serialize};

const LEAF: i32 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub left: i32,
    pub right: i32,
    #[serde(default)]
    pub feature: i32,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<f64>,
}

impl TreeNode {
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            left: left as i32,
            right: right as i32,
            feature: feature as i32,
            threshold,
            value: Vec::new(),
        }
    }

    pub fn leaf(value: Vec<f64>) -> Self {
        Self {
            left: LEAF,
            right: LEAF,
            feature: LEAF,
            threshold: 0.0,
            value,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left == LEAF
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf. Children always sit after their
    /// parent (checked at load), so the walk terminates.
    fn leaf_for(&self, features: &FeatureVector) -> &TreeNode {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node;
            }
            let x = f64::from(features.values[node.feature as usize]);
            idx = if x <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    fn validate(&self, tree_idx: usize, n_classes: usize) -> Result<(), ModelLoadError> {
        let invalid = |msg: String| ModelLoadError::Invalid(format!("tree {}: {}", tree_idx, msg));
        if self.nodes.is_empty() {
            return Err(invalid("no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.value.len() != n_classes {
                    return Err(invalid(format!(
                        "leaf {} has {} class values, expected {}",
                        i,
                        node.value.len(),
                        n_classes
                    )));
                }
                if node.value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(invalid(format!("leaf {} has invalid class values", i)));
                }
                if node.value.iter().sum::<f64>() <= 0.0 {
                    return Err(invalid(format!("leaf {} has no class weight", i)));
                }
                continue;
            }
            if node.feature < 0 || node.feature as usize >= NUM_FEATURES {
                return Err(invalid(format!("node {} splits on feature {}", i, node.feature)));
            }
            for child in [node.left, node.right] {
                if child <= i as i32 || child as usize >= self.nodes.len() {
                    return Err(invalid(format!("node {} has bad child {}", i, child)));
                }
            }
        }
        Ok(())
    }
}

/// Random-forest ensemble with averaged class probabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_classes: usize,
    #[serde(default = "default_n_features")]
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
    #[serde(skip, default = "default_version")]
    version: String,
}

fn default_n_features() -> usize {
    NUM_FEATURES
}

fn default_version() -> String {
    "unversioned".to_string()
}

impl ForestClassifier {
    pub fn new(n_classes: usize, trees: Vec<DecisionTree>) -> Result<Self, ModelLoadError> {
        let forest = Self {
            n_classes,
            n_features: NUM_FEATURES,
            trees,
            version: default_version(),
        };
        forest.validate()?;
        Ok(forest)
    }

    /// Parse a JSON export. Call `validate` before serving predictions.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.n_features != NUM_FEATURES {
            return Err(ModelLoadError::Invalid(format!(
                "forest expects {} features, pipeline provides {}",
                self.n_features, NUM_FEATURES
            )));
        }
        if self.n_classes == 0 {
            return Err(ModelLoadError::Invalid("forest has no classes".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ModelLoadError::Invalid("forest has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_classes)?;
        }
        Ok(())
    }
}

impl Classifier for ForestClassifier {
    fn predict_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictionError> {
        let mut distribution = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf_for(features);
            let total: f64 = leaf.value.iter().sum();
            if total <= 0.0 {
                return Err(PredictionError::Classifier(
                    "reached a leaf with no class weight".to_string(),
                ));
            }
            for (acc, v) in distribution.iter_mut().zip(&leaf.value) {
                *acc += v / total;
            }
        }
        let n_trees = self.trees.len() as f64;
        distribution.iter_mut().for_each(|p| *p /= n_trees);
        Ok(distribution)
    }

    fn num_classes(&self) -> Option<usize> {
        Some(self.n_classes)
    }

    fn model_version(&self) -> &str {
        &self.version
    }

    fn format(&self) -> &'static str {
        "forest"
    }
}
