/// Tests for locating and loading the model/preprocessor pair on disk.
mod common;

use chrono::NaiveDate;
use common::{set_mtime, write_artifacts, write_json, EXTENSION, PREFIX, PREPROCESSOR_FILE};
use house_price_api::artifact_store::{fingerprint, versioned_model_name, ArtifactStore};
use house_price_api::errors::PipelineError;
use house_price_api::inference::InferenceService;
use house_price_api::models::HouseData;
use house_price_api::regressor::TreeEnsemble;
use std::path::Path;
use tempfile::TempDir;

fn store(dir: &Path) -> ArtifactStore {
    ArtifactStore::new(dir, PREFIX, EXTENSION, PREPROCESSOR_FILE)
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[test]
fn empty_directory_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = store(dir.path()).load_latest().unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactNotFound(_)));
}

#[test]
fn missing_directory_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = store(&dir.path().join("does-not-exist"))
        .load_latest()
        .unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactNotFound(_)));
}

#[test]
fn preprocessor_alone_is_not_a_model() {
    let dir = TempDir::new().unwrap();
    write_json(
        &dir.path().join(PREPROCESSOR_FILE),
        &common::fitted_preprocessor(),
    );

    let err = store(dir.path()).load_latest().unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactNotFound(_)));
}

#[test]
fn model_without_preprocessor_is_not_found() {
    let dir = TempDir::new().unwrap();
    let preprocessor = common::fitted_preprocessor();
    write_json(
        &dir.path().join("xgboost_model_20240101_120000.json"),
        &common::model_for(&preprocessor),
    );

    let err = store(dir.path()).load_latest().unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactNotFound(_)));
}

#[test]
fn newest_modification_time_wins_over_name() {
    let dir = TempDir::new().unwrap();
    let older_stamp = write_artifacts(dir.path(), "xgboost_model_20250101_000000.json");
    let newer_stamp = write_artifacts(dir.path(), "xgboost_model_20240101_000000.json");
    set_mtime(&older_stamp, 1_000);
    set_mtime(&newer_stamp, 2_000);

    let latest = store(dir.path()).latest_model_path().unwrap();
    assert_eq!(file_name(&latest), "xgboost_model_20240101_000000.json");
}

#[test]
fn equal_modification_times_pick_greatest_name() {
    let dir = TempDir::new().unwrap();
    let first = write_artifacts(dir.path(), "xgboost_model_20240101_000000.json");
    let second = write_artifacts(dir.path(), "xgboost_model_20240601_000000.json");
    set_mtime(&first, 5_000);
    set_mtime(&second, 5_000);

    let latest = store(dir.path()).latest_model_path().unwrap();
    assert_eq!(file_name(&latest), "xgboost_model_20240601_000000.json");
}

#[test]
fn other_extensions_are_ignored() {
    let dir = TempDir::new().unwrap();
    let model = write_artifacts(dir.path(), "xgboost_model_20240101_000000.json");
    let notes = dir.path().join("xgboost_model_20991231_235959.txt");
    std::fs::write(&notes, "not a model").unwrap();
    set_mtime(&model, 1_000);
    set_mtime(&notes, 9_000);

    let latest = store(dir.path()).latest_model_path().unwrap();
    assert_eq!(latest, model);
}

#[test]
fn leading_dot_in_extension_is_accepted() {
    let dir = TempDir::new().unwrap();
    let model = write_artifacts(dir.path(), "xgboost_model_20240101_000000.json");
    let store = ArtifactStore::new(dir.path(), PREFIX, ".json", PREPROCESSOR_FILE);
    assert_eq!(store.latest_model_path().unwrap(), model);
}

#[test]
fn corrupt_model_is_reported() {
    let dir = TempDir::new().unwrap();
    let model = write_artifacts(dir.path(), "xgboost_model_20240101_000000.json");
    std::fs::write(&model, "{ this is not json").unwrap();

    let err = store(dir.path()).load_latest().unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactCorrupt { .. }));
}

#[test]
fn corrupt_preprocessor_is_reported() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path(), "xgboost_model_20240101_000000.json");
    std::fs::write(dir.path().join(PREPROCESSOR_FILE), r#"{"numeric": 3}"#).unwrap();

    let err = store(dir.path()).load_latest().unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactCorrupt { .. }));
}

#[test]
fn width_mismatch_between_artifacts_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let preprocessor = common::fitted_preprocessor();
    let mut model: TreeEnsemble = common::model_for(&preprocessor);
    model.n_features += 1;
    write_json(&dir.path().join("xgboost_model_20240101_000000.json"), &model);
    write_json(&dir.path().join(PREPROCESSOR_FILE), &preprocessor);

    let err = store(dir.path()).load_latest().unwrap_err();
    assert!(matches!(err, PipelineError::ArtifactCorrupt { .. }));
}

#[test]
fn metadata_describes_the_loaded_model() {
    let dir = TempDir::new().unwrap();
    let stamp = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let name = versioned_model_name(PREFIX, EXTENSION, stamp);
    assert_eq!(name, "xgboost_model_20240315_093000.json");
    let model_path = write_artifacts(dir.path(), &name);

    let loaded = store(dir.path()).load_latest().unwrap();
    let bytes = std::fs::read(&model_path).unwrap();

    assert_eq!(loaded.metadata.file_name, name);
    assert_eq!(loaded.metadata.version, Some(stamp));
    assert_eq!(loaded.metadata.fingerprint, fingerprint(&bytes));
    assert_eq!(loaded.metadata.n_trees, 2);
    assert_eq!(loaded.metadata.n_features, loaded.preprocessor.width());
}

#[test]
fn unconventional_model_name_loads_without_version() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path(), "hand_trained.json");

    let loaded = store(dir.path()).load_latest().unwrap();
    assert_eq!(loaded.metadata.file_name, "hand_trained.json");
    assert_eq!(loaded.metadata.version, None);
}

#[test]
fn loaded_artifacts_serve_predictions() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path(), "xgboost_model_20240101_000000.json");

    let loaded = store(dir.path()).load_latest().unwrap();
    let service = InferenceService::from_artifacts(loaded);
    let price = service.predict(&HouseData::example()).unwrap();

    assert!(price.is_finite());
    assert!(price > 0.0);
    assert!(service.metadata().is_some());
}
