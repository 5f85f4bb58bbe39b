//! Loading of the frozen model artifacts
//!
//! Three artifacts are produced by training and loaded once at startup:
//! the classifier, the per-feature encoders and the target encoder. An
//! optional `manifest.json` names them and may pin SHA-256 checksums.
//! Any failure here is fatal to process start.

use crate::codec::{CategoryCodec, CodecSet};
use crate::error::ModelLoadError;
use crate::predictor::{Classifier, ForestClassifier, OnnxClassifier, PredictionEngine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DEFAULT_FOREST_FILE: &str = "maintenance_model.json";
pub const DEFAULT_ONNX_FILE: &str = "maintenance_model.onnx";
pub const DEFAULT_ENCODERS_FILE: &str = "encoders.json";
pub const DEFAULT_TARGET_ENCODER_FILE: &str = "target_encoder.json";
pub const DEFAULT_MODEL_VERSION: &str = "unversioned";

/// Classifier serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierFormat {
    Forest,
    Onnx,
}

impl ClassifierFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("onnx") => ClassifierFormat::Onnx,
            _ => ClassifierFormat::Forest,
        }
    }
}

/// One artifact file, relative to the artifact directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ArtifactEntry {
    fn named(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            sha256: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierEntry {
    #[serde(flatten)]
    pub artifact: ArtifactEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ClassifierFormat>,
}

/// Describes the artifact set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    #[serde(default = "default_model_version")]
    pub model_version: String,
    pub classifier: ClassifierEntry,
    pub encoders: ArtifactEntry,
    pub target_encoder: ArtifactEntry,
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

impl ArtifactManifest {
    /// Manifest used when the directory has none: default file names,
    /// preferring the JSON forest over ONNX when both exist.
    pub fn default_for(dir: &Path) -> Self {
        let classifier = if !dir.join(DEFAULT_FOREST_FILE).exists()
            && dir.join(DEFAULT_ONNX_FILE).exists()
        {
            DEFAULT_ONNX_FILE
        } else {
            DEFAULT_FOREST_FILE
        };
        Self {
            model_version: default_model_version(),
            classifier: ClassifierEntry {
                artifact: ArtifactEntry::named(classifier),
                format: None,
            },
            encoders: ArtifactEntry::named(DEFAULT_ENCODERS_FILE),
            target_encoder: ArtifactEntry::named(DEFAULT_TARGET_ENCODER_FILE),
        }
    }
}

/// Loaded, validated artifacts
pub struct ModelArtifacts {
    pub classifier: Arc<dyn Classifier>,
    pub codecs: CodecSet,
    pub manifest: ArtifactManifest,
}

impl ModelArtifacts {
    /// Load every artifact from a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            let bytes = read_artifact(&manifest_path)?;
            serde_json::from_slice(&bytes).map_err(|source| ModelLoadError::Parse {
                path: manifest_path.clone(),
                source,
            })?
        } else {
            debug!(dir = %dir.display(), "No manifest, using default artifact names");
            ArtifactManifest::default_for(dir)
        };
        Self::load_with_manifest(dir, manifest)
    }

    pub fn load_with_manifest(dir: &Path, manifest: ArtifactManifest) -> Result<Self, ModelLoadError> {
        let encoders_path = dir.join(&manifest.encoders.path);
        let encoders: HashMap<String, Vec<String>> =
            parse_json(&encoders_path, verified_bytes(&encoders_path, &manifest.encoders)?)?;
        let features = encoders
            .into_iter()
            .map(|(name, classes)| {
                let codec = CategoryCodec::new(classes).map_err(|e| {
                    ModelLoadError::Invalid(format!("encoder {}: {}", name, e))
                })?;
                Ok((name, codec))
            })
            .collect::<Result<HashMap<_, _>, ModelLoadError>>()?;

        let target_path = dir.join(&manifest.target_encoder.path);
        let target_classes: Vec<String> = parse_json(
            &target_path,
            verified_bytes(&target_path, &manifest.target_encoder)?,
        )?;
        let target = CategoryCodec::new(target_classes)
            .map_err(|e| ModelLoadError::Invalid(format!("target encoder: {}", e)))?;
        let codecs = CodecSet::new(features, target)?;

        let classifier_path = dir.join(&manifest.classifier.artifact.path);
        let format = manifest
            .classifier
            .format
            .unwrap_or_else(|| ClassifierFormat::from_path(&classifier_path));
        let bytes = verified_bytes(&classifier_path, &manifest.classifier.artifact)?;
        let classifier: Arc<dyn Classifier> = match format {
            ClassifierFormat::Forest => {
                let forest: ForestClassifier = parse_json(&classifier_path, bytes)?;
                forest.validate()?;
                Arc::new(forest.with_version(manifest.model_version.clone()))
            }
            ClassifierFormat::Onnx => {
                Arc::new(OnnxClassifier::new(&bytes, manifest.model_version.clone())?)
            }
        };

        info!(
            dir = %dir.display(),
            model_version = %manifest.model_version,
            format = ?format,
            labels = ?codecs.target().classes(),
            "Model artifacts loaded"
        );

        Ok(Self {
            classifier,
            codecs,
            manifest,
        })
    }

    /// Build the prediction engine from the loaded artifacts
    pub fn into_engine(self) -> Result<PredictionEngine, ModelLoadError> {
        PredictionEngine::new(self.classifier, self.codecs)
    }
}

/// SHA-256 of a byte slice as lowercase hex
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ModelLoadError> {
    fs::read(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn verified_bytes(path: &Path, entry: &ArtifactEntry) -> Result<Vec<u8>, ModelLoadError> {
    let bytes = read_artifact(path)?;
    if let Some(expected) = &entry.sha256 {
        let actual = compute_checksum(&bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(ModelLoadError::Checksum {
                path: path.to_path_buf(),
                expected: expected.clone(),
                actual,
            });
        }
        debug!(path = %path.display(), checksum = %actual, "Artifact checksum validated");
    }
    Ok(bytes)
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, bytes: Vec<u8>) -> Result<T, ModelLoadError> {
    serde_json::from_slice(&bytes).map_err(|source| ModelLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
