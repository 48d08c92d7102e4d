use house_price_api::api::handlers::{self, AppState};
use house_price_api::config::Config;
use house_price_api::core::artifact_store::ArtifactStore;
use house_price_api::core::inference::InferenceService;
use house_price_api::obs;
use std::net::SocketAddr;
use std::sync::Arc;

/// Main entry point for the prediction API.
///
/// Loads configuration and the artifact pair, publishes the resulting state,
/// and only then binds the listener, so no request can observe a partially
/// loaded pipeline. A failed load is logged and leaves the service running
/// but not ready: `/health` and `/predict` answer 503 until a restart.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    obs::init_tracing(obs::DEFAULT_FILTER);
    tracing::info!("--- API starting up ---");

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let store = ArtifactStore::from_config(&config);
    let predictor = match store.load_latest() {
        Ok(artifacts) => {
            tracing::info!(
                "Model and preprocessor loaded successfully: {} (sha256 {}, {} trees, {} features)",
                artifacts.metadata.file_name,
                artifacts.metadata.fingerprint,
                artifacts.metadata.n_trees,
                artifacts.metadata.n_features
            );
            Some(InferenceService::from_artifacts(artifacts))
        }
        Err(e) => {
            tracing::error!(
                "FATAL: Model or preprocessor could not be loaded from {}: {}. API will not work.",
                store.dir().display(),
                e
            );
            None
        }
    };

    let port = config.port;
    let app_state = Arc::new(AppState::new(config, predictor));
    if !app_state.is_ready() {
        tracing::warn!("Serving without a model: /health, /predict and /model will answer 503");
    }
    let app = handlers::router(app_state)?;

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
