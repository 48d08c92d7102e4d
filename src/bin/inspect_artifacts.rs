//! Utility to inspect the artifact directory and print what the API would load.

use house_price_api::config::Config;
use house_price_api::core::artifact_store::ArtifactStore;
use house_price_api::obs;

/// Main entry point for the artifact inspection utility.
///
/// Resolves the artifact directory from the same environment as the API,
/// loads the latest pair and lists the model metadata and the
/// preprocessor's output columns.
fn main() -> anyhow::Result<()> {
    obs::init_tracing("house_price_api=info");
    let config = Config::from_env()?;
    let store = ArtifactStore::from_config(&config);

    println!("Artifact directory: {}", store.dir().display());
    let artifacts = store.load_latest()?;
    let metadata = &artifacts.metadata;

    println!("Selected model: {}", metadata.file_name);
    match metadata.version {
        Some(version) => println!("  - version: {}", version),
        None => println!("  - version: (name does not follow the timestamp convention)"),
    }
    println!("  - sha256: {}", metadata.fingerprint);
    println!("  - trees: {}", metadata.n_trees);
    println!("  - features: {}", metadata.n_features);
    println!();

    let preprocessor = &artifacts.preprocessor;
    println!(
        "Preprocessor: {} numeric, {} categorical, {} passthrough columns",
        preprocessor.numeric.len(),
        preprocessor.categorical.len(),
        preprocessor.passthrough.len()
    );
    for (index, name) in preprocessor.feature_names().iter().enumerate() {
        println!("  {:>4}: {}", index, name);
    }

    Ok(())
}
