use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Failures raised inside the prediction pipeline.
///
/// Artifact errors are terminal for readiness; the remaining variants are
/// local to a single prediction.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No model candidate, no preprocessor file, or an unreadable directory.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
    /// An artifact exists but could not be deserialized or validated.
    #[error("artifact corrupt: {path}: {reason}")]
    ArtifactCorrupt { path: String, reason: String },
    /// Inference attempted before a successful artifact load.
    #[error("model not ready: artifacts are not loaded")]
    ModelNotReady,
    /// A column required by a derived-feature formula is missing or not numeric.
    #[error("input incomplete: column `{column}` is missing or not numeric")]
    InputIncomplete { column: String },
    /// Any failure inside the transform/score/inverse-transform sequence.
    #[error("prediction failed: {reason}")]
    PredictionFailed {
        reason: String,
        #[source]
        cause: Option<Box<PipelineError>>,
    },
}

impl PipelineError {
    pub fn input_incomplete(column: impl Into<String>) -> Self {
        PipelineError::InputIncomplete {
            column: column.into(),
        }
    }

    /// A prediction failure with no underlying pipeline error.
    pub fn failed(reason: impl Into<String>) -> Self {
        PipelineError::PredictionFailed {
            reason: reason.into(),
            cause: None,
        }
    }

    /// Wrap an error raised by a pipeline step as a prediction failure.
    ///
    /// Already-wrapped failures are returned unchanged so the cause chain
    /// stays one level deep.
    pub fn into_prediction_failure(self) -> Self {
        match self {
            failure @ PipelineError::PredictionFailed { .. } => failure,
            other => PipelineError::PredictionFailed {
                reason: other.to_string(),
                cause: Some(Box::new(other)),
            },
        }
    }

    /// True when this error, or the error it wraps, is an incomplete input.
    pub fn is_input_incomplete(&self) -> bool {
        match self {
            PipelineError::InputIncomplete { .. } => true,
            PipelineError::PredictionFailed {
                cause: Some(cause), ..
            } => cause.is_input_incomplete(),
            _ => false,
        }
    }
}

/// Application-specific error types returned by HTTP handlers.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Artifacts are not loaded; the service refuses predictions.
    ServiceUnavailable(String),
    /// The request was well-formed JSON but cannot be scored.
    Unprocessable(String),
    /// The pipeline failed for this request.
    PredictionFailed(String),
    /// Internal server error.
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::Unprocessable(msg) => write!(f, "Unprocessable input: {}", msg),
            AppError::PredictionFailed(msg) => write!(f, "Prediction failed: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PredictionFailed(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status and a JSON body, logging by severity.
    fn into_response(self) -> Response {
        let error_message = match &self {
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Rejected request, service not ready: {}", msg);
                "Model not loaded. API is not ready.".to_string()
            }
            AppError::Unprocessable(msg) => msg.clone(),
            AppError::PredictionFailed(msg) => {
                tracing::error!("Prediction failed: {}", msg);
                "Prediction could not be made.".to_string()
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (self.status(), body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        if err.is_input_incomplete() {
            return AppError::Unprocessable(err.to_string());
        }
        match err {
            PipelineError::ModelNotReady => AppError::ServiceUnavailable(err.to_string()),
            PipelineError::PredictionFailed { .. } => AppError::PredictionFailed(err.to_string()),
            PipelineError::ArtifactNotFound(_) | PipelineError::ArtifactCorrupt { .. } => {
                AppError::ServiceUnavailable(err.to_string())
            }
            PipelineError::InputIncomplete { .. } => AppError::Unprocessable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_keeps_single_level() {
        let wrapped = PipelineError::input_incomplete("YrSold").into_prediction_failure();
        let rewrapped = wrapped.into_prediction_failure();

        match rewrapped {
            PipelineError::PredictionFailed {
                cause: Some(cause), ..
            } => assert!(matches!(*cause, PipelineError::InputIncomplete { .. })),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrapped_input_incomplete_maps_to_422() {
        let err = PipelineError::input_incomplete("YearBuilt").into_prediction_failure();
        let app: AppError = err.into();
        assert_eq!(app.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn not_ready_maps_to_503() {
        let app: AppError = PipelineError::ModelNotReady.into();
        assert_eq!(app.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn scoring_failure_maps_to_500() {
        let app: AppError = PipelineError::failed("non-finite estimate").into();
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
