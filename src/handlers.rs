use crate::config::Config;
use crate::errors::AppError;
use crate::inference::{predict_with, InferenceService};
use crate::models::{HouseData, PredictionResponse};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

/// Shared application state injected into handlers.
///
/// Built once before the listener is bound and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Loaded pipeline; `None` when artifact loading failed at startup.
    pub predictor: Option<Arc<InferenceService>>,
}

impl AppState {
    pub fn new(config: Config, predictor: Option<InferenceService>) -> Self {
        Self {
            config,
            predictor: predictor.map(Arc::new),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.predictor.is_some()
    }
}

/// GET /
///
/// Confirms the process is up, regardless of model readiness.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "status": "API is running!" }))
}

/// GET /health
///
/// Readiness probe. Reports ready only when both artifacts are loaded and
/// never runs a prediction to find out.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    match &state.predictor {
        Some(predictor) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "model_loaded": true,
                "model": predictor.metadata(),
            })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "model_loaded": false,
            })),
        ),
    }
}

/// POST /predict
///
/// Scores one house. Schema violations are rejected by the `Json` extractor
/// before this runs.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(house): Json<HouseData>,
) -> Result<Json<PredictionResponse>, AppError> {
    let price = predict_with(state.predictor.as_deref(), &house)?;

    tracing::info!(
        "Predicted {} for {} house in {}",
        format_usd(price),
        house.bldg_type,
        house.neighborhood
    );

    Ok(Json(PredictionResponse {
        predicted_price: price,
        predicted_price_formatted: format_usd(price),
    }))
}

/// GET /model
///
/// Metadata of the loaded model: file name, version stamp, fingerprint,
/// feature width and tree count, plus the preprocessor's output columns.
pub async fn model_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let predictor = state.predictor.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("model info requested before artifacts loaded".to_string())
    })?;

    Ok(Json(json!({
        "model": predictor.metadata(),
        "feature_names": predictor.preprocessor().feature_names(),
    })))
}

/// Builds the application router.
///
/// `/` and `/health` bypass the rate limiter so probes are never throttled.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let mut prediction_routes = Router::new()
        .route("/predict", post(predict))
        .route("/model", get(model_info));

    if let Some(limit) = &state.config.rate_limit {
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(limit.per_second)
                .burst_size(limit.burst)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
        );
        prediction_routes = prediction_routes.layer(GovernorLayer {
            config: governor_conf,
        });
    }

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(prediction_routes)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    state.config.request_timeout_secs,
                ))),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Ok(app)
}

/// Renders a price as US dollars with thousands separators, e.g. `$208,500.00`.
pub fn format_usd(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}
