//! The serving pipeline: basement total, feature derivation, preprocessing,
//! model scoring and the inverse of the training-time `log1p` target
//! transform.
//!
//! An [`InferenceService`] is built once from loaded artifacts and shared
//! read-only across request handlers. Nothing in it is mutated after
//! construction, so concurrent predictions need no locking.

use crate::artifact_store::{LoadedArtifacts, ModelMetadata};
use crate::errors::PipelineError;
use crate::features::{self, FeatureRecord};
use crate::models::HouseData;
use crate::preprocessing::FittedPreprocessor;
use crate::regressor::Regressor;

#[derive(Debug)]
pub struct InferenceService {
    model: Box<dyn Regressor>,
    preprocessor: FittedPreprocessor,
    metadata: Option<ModelMetadata>,
}

impl InferenceService {
    /// Builds a service from an arbitrary model, e.g. a fixed-output stub.
    pub fn new(model: impl Regressor + 'static, preprocessor: FittedPreprocessor) -> Self {
        Self {
            model: Box::new(model),
            preprocessor,
            metadata: None,
        }
    }

    pub fn from_artifacts(artifacts: LoadedArtifacts) -> Self {
        Self {
            model: Box::new(artifacts.model),
            preprocessor: artifacts.preprocessor,
            metadata: Some(artifacts.metadata),
        }
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    /// Estimated sale price for one house.
    pub fn predict(&self, house: &HouseData) -> Result<f64, PipelineError> {
        self.predict_record(house.to_record())
    }

    /// Estimated sale price for a raw column record.
    ///
    /// Every failure is reported as `PredictionFailed` wrapping its cause;
    /// there is no fallback value.
    pub fn predict_record(&self, record: FeatureRecord) -> Result<f64, PipelineError> {
        self.run(record)
            .map_err(PipelineError::into_prediction_failure)
    }

    fn run(&self, record: FeatureRecord) -> Result<f64, PipelineError> {
        let record = features::attach_basement_total(record)?;
        let engineered = features::derive(record)?;
        let vector = self.preprocessor.transform(&engineered)?;

        let log_price = self.model.predict(vector.as_slice())?;
        let price = log_price.exp_m1();

        if !price.is_finite() {
            return Err(PipelineError::failed(format!(
                "estimate is not finite (log-scale score {})",
                log_price
            )));
        }
        if price < 0.0 {
            return Err(PipelineError::failed(format!(
                "estimate {} is negative (log-scale score {})",
                price, log_price
            )));
        }

        tracing::debug!(log_price, price, "Prediction complete");
        Ok(price)
    }
}

/// Runs a prediction against a possibly-absent service.
///
/// `None` means artifacts never loaded, which is `ModelNotReady`.
pub fn predict_with(
    service: Option<&InferenceService>,
    house: &HouseData,
) -> Result<f64, PipelineError> {
    service.ok_or(PipelineError::ModelNotReady)?.predict(house)
}
