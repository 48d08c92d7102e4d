//! Scores the latest artifacts against a labeled sample.
//!
//! Usage: `evaluate_model <labeled.json>` where the file holds
//! `[{"record": {...house fields...}, "sale_price": 208500}, ...]`.
//! Metrics are reported on the log1p scale the model was trained on.

use anyhow::Context;
use house_price_api::api::models::LabeledHouse;
use house_price_api::config::Config;
use house_price_api::core::artifact_store::ArtifactStore;
use house_price_api::core::inference::InferenceService;
use house_price_api::evaluate::{r2, rmse};
use house_price_api::obs;

fn main() -> anyhow::Result<()> {
    obs::init_tracing("house_price_api=info");

    let path = std::env::args()
        .nth(1)
        .context("usage: evaluate_model <labeled.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let sample: Vec<LabeledHouse> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;

    let config = Config::from_env()?;
    let artifacts = ArtifactStore::from_config(&config).load_latest()?;
    println!("Evaluating {} on {} houses", artifacts.metadata.file_name, sample.len());
    let service = InferenceService::from_artifacts(artifacts);

    let mut y_true = Vec::with_capacity(sample.len());
    let mut y_pred = Vec::with_capacity(sample.len());
    let mut failures = 0usize;

    for (index, labeled) in sample.iter().enumerate() {
        match service.predict(&labeled.record) {
            Ok(price) => {
                y_true.push(labeled.sale_price.ln_1p());
                y_pred.push(price.ln_1p());
            }
            Err(e) => {
                failures += 1;
                tracing::warn!("Row {} could not be scored: {}", index, e);
            }
        }
    }

    println!("Evaluation Metrics:");
    println!("  - Root Mean Squared Error (RMSE): {:.4}", rmse(&y_true, &y_pred)?);
    println!("  - R-squared (R²): {:.4}", r2(&y_true, &y_pred)?);
    if failures > 0 {
        println!("  - Rows skipped: {}", failures);
    }

    Ok(())
}
