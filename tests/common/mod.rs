//! Shared fixtures: a small fitted preprocessor, a matching tree ensemble,
//! and helpers to lay them out on disk the way the training side does.
#![allow(dead_code)]

use house_price_api::features::{self, FeatureRecord};
use house_price_api::models::{HouseData, CATEGORICAL_COLUMNS};
use house_price_api::preprocessing::{column_kinds, FittedPreprocessor};
use house_price_api::regressor::{Node, Tree, TreeEnsemble};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const PREFIX: &str = "xgboost_model";
pub const EXTENSION: &str = "json";
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";

/// The example house plus two variants with different neighborhoods, ages
/// and optional amenities.
pub fn training_houses() -> Vec<HouseData> {
    let example = HouseData::example();

    let mut upscale = example.clone();
    upscale.neighborhood = "NridgHt".to_string();
    upscale.alley = Some("Grvl".to_string());
    upscale.pool_qc = Some("Ex".to_string());
    upscale.fence = Some("MnPrv".to_string());
    upscale.misc_feature = Some("Shed".to_string());
    upscale.fireplace_qu = Some("TA".to_string());
    upscale.fireplaces = 1;
    upscale.year_remod_add = 2006;
    upscale.yr_sold = 2009;
    upscale.lot_frontage = None;
    upscale.gr_liv_area = 2100;
    upscale.overall_qual = 8;

    let mut older = example.clone();
    older.neighborhood = "OldTown".to_string();
    older.year_built = 1925;
    older.year_remod_add = 1995;
    older.yr_sold = 2007;
    older.garage_type = None;
    older.garage_yr_blt = None;
    older.garage_finish = None;
    older.garage_qual = None;
    older.garage_cond = None;
    older.garage_cars = 0;
    older.garage_area = 0;
    older.mas_vnr_type = None;
    older.mas_vnr_area = None;
    older.bsmt_qual = None;
    older.bsmt_cond = None;
    older.bsmt_exposure = None;
    older.bsmt_fin_type1 = None;
    older.bsmt_fin_type2 = None;
    older.bsmt_fin_sf1 = 0;
    older.bsmt_fin_sf2 = 0;
    older.bsmt_unf_sf = 0;
    older.overall_qual = 5;
    older.fence = Some("GdPrv".to_string());

    vec![example, upscale, older]
}

/// Training-time feature engineering for one house.
pub fn engineer(house: &HouseData) -> FeatureRecord {
    let record = features::attach_basement_total(house.to_record()).unwrap();
    features::derive(record).unwrap()
}

pub fn fitted_preprocessor() -> FittedPreprocessor {
    let frame: Vec<FeatureRecord> = training_houses().iter().map(engineer).collect();
    let (numeric, categorical) = column_kinds(&frame, &CATEGORICAL_COLUMNS);
    FittedPreprocessor::fit(&frame, &numeric, &categorical).unwrap()
}

/// A two-tree ensemble over the fixture preprocessor's layout.
pub fn model_for(preprocessor: &FittedPreprocessor) -> TreeEnsemble {
    let names = preprocessor.feature_names();
    let position = |name: &str| names.iter().position(|n| n == name).unwrap();

    TreeEnsemble {
        n_features: preprocessor.width(),
        base_score: 12.0,
        trees: vec![
            stump(position("num__OverallQual"), 0.0, -0.1, 0.15, false),
            stump(position("cat__Neighborhood_OldTown"), 0.5, 0.05, -0.2, true),
        ],
    }
}

fn stump(feature: usize, threshold: f64, left: f64, right: f64, default_left: bool) -> Tree {
    Tree {
        nodes: vec![
            Node::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
                default_left,
            },
            Node::Leaf { value: left },
            Node::Leaf { value: right },
        ],
    }
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// Writes a model file named `model_name` and the fixed preprocessor file.
pub fn write_artifacts(dir: &Path, model_name: &str) -> PathBuf {
    let preprocessor = fitted_preprocessor();
    let model_path = dir.join(model_name);
    write_json(&model_path, &model_for(&preprocessor));
    write_json(&dir.join(PREPROCESSOR_FILE), &preprocessor);
    model_path
}

/// Sets a file's modification time to `secs` after the Unix epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}
