//! End-to-end pipeline tests: artifacts on disk -> engine -> explanation -> report

use maintenance_lib::artifacts::{compute_checksum, MANIFEST_FILE};
use maintenance_lib::report::{HEADING_EXPLANATION, REPORT_TITLE};
use maintenance_lib::{
    explain_best_effort, DisabledExplainer, ModelArtifacts, ModelLoadError, Observation,
    PredictionError, ReportInput, ReportRenderer, RiskTier, EXPLANATION_PLACEHOLDER,
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const FOREST: &str = r#"{
  "n_classes": 3,
  "n_features": 7,
  "trees": [
    {"nodes": [
      {"left": 1, "right": 2, "feature": 5, "threshold": 0.5},
      {"left": -1, "right": -1, "value": [0.0, 12.0, 1.0]},
      {"left": -1, "right": -1, "value": [9.0, 0.0, 3.0]}
    ]}
  ]
}"#;

const ENCODERS: &str = r#"{
  "material_type": ["Brick", "Cement", "Steel"],
  "usage_frequency": ["High", "Low", "Medium"],
  "humidity_exposure": ["High", "Low", "Medium"],
  "load_stress_level": ["High", "Low", "Medium"],
  "cracks_visible": ["No", "Yes"]
}"#;

const TARGET: &str = r#"["Critical", "Good", "Moderate"]"#;

fn write_artifacts(dir: &Path) {
    fs::write(dir.join("maintenance_model.json"), FOREST).unwrap();
    fs::write(dir.join("encoders.json"), ENCODERS).unwrap();
    fs::write(dir.join("target_encoder.json"), TARGET).unwrap();
}

fn observation(material: &str, cracks: &str) -> Observation {
    Observation {
        material_type: material.to_string(),
        material_age_days: 60,
        usage_frequency: "Medium".to_string(),
        humidity_exposure: "Medium".to_string(),
        load_stress_level: "Medium".to_string(),
        cracks_visible: cracks.to_string(),
        last_maintenance_days: 45,
    }
}

#[test]
fn test_artifacts_load_with_default_names() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());

    let artifacts = ModelArtifacts::load_dir(dir.path()).unwrap();
    assert_eq!(artifacts.codecs.target().classes(), &["Critical", "Good", "Moderate"]);
    assert_eq!(artifacts.manifest.model_version, "unversioned");
}

#[test]
fn test_missing_artifact_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    fs::remove_file(dir.path().join("target_encoder.json")).unwrap();

    assert!(matches!(
        ModelArtifacts::load_dir(dir.path()),
        Err(ModelLoadError::Io { .. })
    ));
}

#[test]
fn test_zero_weight_leaf_is_fatal_at_load() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let forest = FOREST.replace("[9.0, 0.0, 3.0]", "[0.0, 0.0, 0.0]");
    fs::write(dir.path().join("maintenance_model.json"), forest).unwrap();

    assert!(matches!(
        ModelArtifacts::load_dir(dir.path()),
        Err(ModelLoadError::Invalid(_))
    ));
}

#[test]
fn test_manifest_checksums_are_enforced() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let manifest = serde_json::json!({
        "model_version": "2024.03",
        "classifier": {"path": "maintenance_model.json", "format": "forest", "sha256": compute_checksum(FOREST.as_bytes())},
        "encoders": {"path": "encoders.json", "sha256": "00".repeat(32)},
        "target_encoder": {"path": "target_encoder.json"}
    });
    fs::write(dir.path().join(MANIFEST_FILE), manifest.to_string()).unwrap();

    assert!(matches!(
        ModelArtifacts::load_dir(dir.path()),
        Err(ModelLoadError::Checksum { .. })
    ));
}

#[test]
fn test_manifest_version_reaches_predictions() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let manifest = serde_json::json!({
        "model_version": "2024.03",
        "classifier": {"path": "maintenance_model.json"},
        "encoders": {"path": "encoders.json", "sha256": compute_checksum(ENCODERS.as_bytes())},
        "target_encoder": {"path": "target_encoder.json"}
    });
    fs::write(dir.path().join(MANIFEST_FILE), manifest.to_string()).unwrap();

    let engine = ModelArtifacts::load_dir(dir.path()).unwrap().into_engine().unwrap();
    let prediction = engine.predict(&observation("Steel", "No")).unwrap();
    assert_eq!(prediction.model_version, "2024.03");
}

#[tokio::test]
async fn test_full_report_with_unavailable_explanation() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let engine = ModelArtifacts::load_dir(dir.path()).unwrap().into_engine().unwrap();

    let obs = observation("Steel", "No");
    let prediction = engine.predict(&obs).unwrap();
    assert_eq!(prediction.label, "Good");
    assert!((prediction.confidence - 1200.0 / 13.0).abs() < 1e-9);
    assert_eq!(prediction.risk_tier, RiskTier::High);
    assert_eq!(prediction.recommendation, "No maintenance required.");

    let outcome =
        explain_best_effort(&DisabledExplainer, &obs, &prediction, Duration::from_secs(1)).await;
    assert_eq!(outcome.text(), EXPLANATION_PLACEHOLDER);

    let fields = obs.report_fields();
    let out = TempDir::new().unwrap();
    let path = out.path().join("Maintenance_Report.pdf");
    let input = ReportInput::new(&fields, &prediction, outcome.text());
    let document = ReportRenderer::new().render_to(&path, &input).unwrap();

    assert_eq!(document.page_count(), 1);
    let text = document.to_text();
    assert!(text.starts_with(REPORT_TITLE));
    assert!(text.contains("Material Type: Steel"));
    assert!(text.contains("Predicted Condition: Good"));
    assert!(text.contains("Risk Confidence: 92.31%"));
    assert!(text.contains("Risk Level: HIGH"));
    let explanation_at = text.find(HEADING_EXPLANATION).unwrap();
    assert!(text[explanation_at..].contains(EXPLANATION_PLACEHOLDER));

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
}

#[test]
fn test_cracked_material_needs_replacement() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let engine = ModelArtifacts::load_dir(dir.path()).unwrap().into_engine().unwrap();

    let prediction = engine.predict(&observation("Brick", "Yes")).unwrap();
    assert_eq!(prediction.label, "Critical");
    assert!((prediction.confidence - 75.0).abs() < 1e-9);
    assert_eq!(prediction.risk_tier, RiskTier::High);
    assert_eq!(prediction.recommendation, "Immediate replacement required.");
}

#[test]
fn test_unknown_material_rejected_before_report() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let engine = ModelArtifacts::load_dir(dir.path()).unwrap().into_engine().unwrap();

    match engine.predict(&observation("Wood", "No")) {
        Err(PredictionError::UnknownCategory(e)) => {
            assert_eq!(e.feature, "material_type");
            assert_eq!(e.value, "Wood");
        }
        other => panic!("expected unknown category, got {:?}", other),
    }
}
